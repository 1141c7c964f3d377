//! CPLEX LP file export.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::*;

const TERMS_PER_LINE: usize = 8;

fn write_expr(w: &mut impl Write, model: &Model, e: &LinExpr) -> io::Result<()> {
    if e.terms().is_empty() {
        write!(w, " 0 {}", model.vars.first().map(|v| v.name.as_str()).unwrap_or(""))?;
    }
    for (k, (v, c)) in e.terms().iter().enumerate() {
        if k > 0 && k % TERMS_PER_LINE == 0 {
            write!(w, "\n  ")?;
        }
        let sign = if *c < 0.0 { '-' } else { '+' };
        write!(w, " {} {} {}", sign, c.abs(), model.var(*v).name)?;
    }
    if e.offset() != 0.0 {
        let sign = if e.offset() < 0.0 { '-' } else { '+' };
        write!(w, " {} {}", sign, e.offset().abs())?;
    }
    Ok(())
}

fn fmt_bound(b: f64) -> String {
    if b == f64::INFINITY {
        "+inf".to_string()
    } else if b == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        b.to_string()
    }
}

impl Model {
    pub fn write_lp(&self, mut w: impl Write) -> io::Result<()> {
        writeln!(w, "\\ Model {}", self.name)?;
        writeln!(w, "{}", match self.sense {
            ObjSense::Maximize => "Maximize",
            ObjSense::Minimize => "Minimize",
        })?;
        write!(w, " obj:")?;
        write_expr(&mut w, self, &self.objective)?;
        writeln!(w)?;

        writeln!(w, "Subject To")?;
        for c in &self.constrs {
            write!(w, " {}:", c.name)?;
            write_expr(&mut w, self, &c.lhs)?;
            writeln!(w, " {} {}", c.sense, c.rhs)?;
        }

        writeln!(w, "Bounds")?;
        for v in self.vars.iter().filter(|v| v.vtype != VarType::Binary) {
            writeln!(w, " {} <= {} <= {}", fmt_bound(v.lb), v.name, fmt_bound(v.ub))?;
        }

        for (header, vtype) in &[("Binaries", VarType::Binary), ("Generals", VarType::Integer)] {
            let names: Vec<_> = self.vars.iter().filter(|v| v.vtype == *vtype).map(|v| v.name.as_str()).collect();
            if names.is_empty() { continue }
            writeln!(w, "{}", header)?;
            for chunk in names.chunks(TERMS_PER_LINE) {
                writeln!(w, " {}", chunk.join(" "))?;
            }
        }
        writeln!(w, "End")?;
        Ok(())
    }

    pub fn save_lp(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_lp(&mut w)?;
        w.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_lp_file() {
        let mut m = Model::new("small");
        let x = m.add_binary("x");
        let t = m.add_continuous("t", 0.0, 30.0);
        let k = m.add_var("k", VarType::Integer, 1.0, 4.0);
        m.add_constr("link", (LinExpr::from(t) - 10.0 * x).ge(2.0));
        m.add_constr("count", (k - x).le(3.0));
        m.set_objective(LinExpr::from(t) - 0.5 * k, ObjSense::Maximize);

        let mut buf = Vec::new();
        m.write_lp(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "\
\\ Model small
Maximize
 obj: + 1 t - 0.5 k
Subject To
 link: - 10 x + 1 t >= 2
 count: - 1 x + 1 k <= 3
Bounds
 0 <= t <= 30
 1 <= k <= 4
Binaries
 x
Generals
 k
End
");
    }
}
