use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{Context, Result};
use structopt::StructOpt;

pub const OUTPUT_FORMAT_STRINGS: [&str; 2] = ["text", "json"];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Extension used for report files in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format `{}`", s)),
        }
    }
}

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
    #[structopt(long="format", short="f", default_value="text", possible_values=&OUTPUT_FORMAT_STRINGS)]
    pub fmt: OutputFormat,
    /// Write to this file instead of stdout
    #[structopt(long="output", short="o")]
    pub file: Option<PathBuf>,
}

/// Accepts numbers within `[min, max]`; either end may be open.
pub fn clap_range_validator<T>(min: Option<T>, max: Option<T>) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd + Display + Copy,
        T::Err: Display
{
    move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        match (min, max) {
            (Some(lo), _) if x < lo => Err(format!("must be at least {}", lo)),
            (_, Some(hi)) if x > hi => Err(format!("must be at most {}", hi)),
            _ => Ok(()),
        }
    }
}

/// A result that can be rendered as a human-readable report or as JSON.
pub trait Printable {
    fn write_json(&self, buf: impl Write) -> Result<()>;
    fn write_text(&self, buf: impl Write) -> Result<()>;

    fn write(&self, buf: impl Write, fmt: OutputFormat) -> Result<()> {
        match fmt {
            OutputFormat::Json => self.write_json(buf),
            OutputFormat::Text => self.write_text(buf),
        }
    }

    fn render(&self, fmt: OutputFormat) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf, fmt)?;
        Ok(buf)
    }
}

impl OutputOptions {
    pub fn emit(&self, item: impl Printable) -> Result<()> {
        match &self.file {
            Some(path) => {
                let mut writer = create(path)?;
                item.write(&mut writer, self.fmt)?;
                writer.flush()?;
            },
            None => item.write(io::stdout().lock(), self.fmt)?,
        }
        Ok(())
    }
}

pub fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    Ok(BufWriter::new(file))
}

/// Directory receiving one set of files per instance, named after the instance id.
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).with_context(|| format!("failed to create directory {:?}", root))?;
        Ok(ArtifactDir { root: root.to_path_buf() })
    }

    pub fn path(&self, id: &str, suffix: &str) -> PathBuf {
        self.root.join(format!("{}{}", id, suffix))
    }

    pub fn create(&self, id: &str, suffix: &str) -> Result<BufWriter<File>> {
        create(&self.path(id, suffix))
    }
}
