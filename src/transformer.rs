//! # Record Transformation
//!
//! [`Metafix`] holds a compiled script and runs it against one record at a
//! time. The walk itself lives in [`RecordTransformer`]:
//!
//! 1. calls dispatch to their [`FixMethod`](crate::fix::FixMethod)
//! 2. `if`/`elsif`/`else` and `unless` test their conditional against the
//!    current record and run the chosen body
//! 3. `list` binds run their body once per value found at the bound path,
//!    against a scope holding only that value; whatever the body adds to the
//!    scope is merged back into the enclosing record
//!
//! A rejected record still runs to the end of the script. Errors abort the
//! record and are returned to the caller.
//!
//! # Examples
//!
//! ```
//! use recfix::{Fix, Metafix, Outcome, Record, Vars};
//!
//! let fix = Fix::from_json(r#"[{"kind": "call", "name": "upcase", "params": ["title"]}]"#).unwrap();
//! let metafix = Metafix::new(&fix, &Vars::new()).unwrap();
//!
//! let record = Record::from_literals([("title", "faust")]).unwrap();
//! match metafix.transform(record).unwrap() {
//!     Outcome::Emit(record) => assert_eq!(record.find("title").unwrap().as_scalar().unwrap(), "FAUST"),
//!     Outcome::Rejected(_) => unreachable!(),
//! }
//! ```

use std::borrow::Cow;

use crate::{
    error::Result,
    fix::{Expression, Fix, Vars},
    lookup::MapRegistry,
    record::Record,
};

/// What became of a transformed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Emit(Record),

    /// The script called `reject`; the record should not be emitted.
    Rejected(Record),
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    pub fn record(&self) -> &Record {
        match self {
            Outcome::Emit(record) | Outcome::Rejected(record) => record,
        }
    }

    pub fn into_record(self) -> Record {
        match self {
            Outcome::Emit(record) | Outcome::Rejected(record) => record,
        }
    }
}

/// A compiled script, ready to transform any number of records.
///
/// `Metafix` is `Send + Sync`; distinct records may be transformed on
/// different threads against the same instance.
#[derive(Debug)]
pub struct Metafix {
    expressions: Vec<Expression>,
}

impl Metafix {
    /// Compiles `fix` with a fresh [`MapRegistry`].
    pub fn new(fix: &Fix, vars: &Vars) -> Result<Self> {
        Metafix::with_maps(fix, vars, &MapRegistry::new())
    }

    pub fn with_maps(fix: &Fix, vars: &Vars, maps: &MapRegistry) -> Result<Self> {
        Ok(Metafix {
            expressions: fix.compile(vars, maps)?,
        })
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn transform(&self, mut record: Record) -> Result<Outcome> {
        RecordTransformer::new(&self.expressions).transform(&mut record)?;
        if record.is_rejected() {
            Ok(Outcome::Rejected(record))
        } else {
            Ok(Outcome::Emit(record))
        }
    }
}

/// Executes compiled expressions against a record in place.
pub struct RecordTransformer<'f> {
    expressions: &'f [Expression],
}

impl<'f> RecordTransformer<'f> {
    pub fn new(expressions: &'f [Expression]) -> Self {
        RecordTransformer { expressions }
    }

    pub fn transform(&self, record: &mut Record) -> Result<()> {
        process(self.expressions, record)
    }
}

fn process(expressions: &[Expression], record: &mut Record) -> Result<()> {
    for expression in expressions {
        match expression {
            Expression::Call(method) => {
                log::trace!("Calling {}", method);
                method.apply(record)?;
            }
            Expression::If { branches, otherwise } => {
                let body = branches
                    .iter()
                    .find(|(conditional, _)| conditional.test(record))
                    .map_or(otherwise, |(_, body)| body);
                process(body, record)?;
            }
            Expression::Unless { conditional, body } => {
                if !conditional.test(record) {
                    process(body, record)?;
                }
            }
            Expression::Bind { var, path, body } => bind(var, path, body, record)?,
        }
    }
    Ok(())
}

fn bind(var: &str, path: &str, body: &[Expression], record: &mut Record) -> Result<()> {
    let Some(values) = record.find(path).map(Cow::into_owned) else {
        return Ok(());
    };
    for (index, value) in values.into_list().into_iter().enumerate() {
        log::debug!("Binding {} to {}.{}", var, path, index + 1);
        let mut scope = Record::new();
        scope.put(var, value);
        process(body, &mut scope)?;
        scope.remove_field(var);
        if scope.is_rejected() {
            record.reject();
        }
        record.add_all(scope.into_hash());
    }
    Ok(())
}
