use crate::errors::Result;
use crate::sync::compare::Comparison;
use serde::{Deserialize, Serialize};

/// A row of the `records` table, and of the NDJSON feeds synced into it.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(Queryable))]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub amount: i64,
}

impl Record {
    pub fn new<S: Into<String>>(id: i64, name: S, amount: i64) -> Record {
        Record {
            id,
            name: name.into(),
            amount,
        }
    }

    /// Sort and join key.
    pub fn key(&self) -> i64 {
        self.id
    }
}

/// Compares the non-key fields of two records sharing an id.
pub fn compare_records(source: &Record, destination: &Record) -> Result<Comparison> {
    Ok(Comparison::from_fields(vec![
        ("name", source.name == destination.name),
        ("amount", source.amount == destination.amount),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_records() {
        let current = Record::new(108, "invoice", 250);

        assert_eq!(
            compare_records(&Record::new(108, "invoice", 250), &current).unwrap(),
            Comparison::Equal
        );
        assert_eq!(
            compare_records(&Record::new(108, "credit", 200), &current).unwrap(),
            Comparison::Changed(vec!["name".into(), "amount".into()])
        );
    }

    #[test]
    fn test_record_from_json() {
        let record: Record = serde_json::from_str(r#"{"id":102,"name":"a","amount":100}"#).unwrap();

        assert_eq!(record.key(), 102);
        assert_eq!(record, Record::new(102, "a", 100));
    }
}
