use crate::errors::Result;

/// Result of comparing the non-key fields of a matched pair.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Comparison {
    Equal,
    /// Names of the fields that differ. May be empty when the comparator does not
    /// itemise its changes.
    Changed(Vec<String>),
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        *self == Comparison::Equal
    }

    /// Builds a comparison from `(field, equal)` pairs.
    pub fn from_fields<'a, I>(fields: I) -> Comparison
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let changed: Vec<String> = fields
            .into_iter()
            .filter(|(_, equal)| !equal)
            .map(|(name, _)| String::from(name))
            .collect();

        if changed.is_empty() {
            Comparison::Equal
        } else {
            Comparison::Changed(changed)
        }
    }
}

/// Field-equality check for rows that share a key.
pub trait RowComparator<L, R> {
    fn compare(&self, source: &L, destination: &R) -> Result<Comparison>;
}

impl<L, R, F> RowComparator<L, R> for F
where
    F: Fn(&L, &R) -> Result<Comparison>,
{
    fn compare(&self, source: &L, destination: &R) -> Result<Comparison> {
        self(source, destination)
    }
}

/// Compares whole rows with `PartialEq`; changed fields are not itemised.
#[derive(Copy, Clone, Debug, Default)]
pub struct EqComparator;

impl<T: PartialEq> RowComparator<T, T> for EqComparator {
    fn compare(&self, source: &T, destination: &T) -> Result<Comparison> {
        if source == destination {
            Ok(Comparison::Equal)
        } else {
            Ok(Comparison::Changed(vec![]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields() {
        assert_eq!(
            Comparison::from_fields(vec![("name", true), ("amount", true)]),
            Comparison::Equal
        );
        assert_eq!(
            Comparison::from_fields(vec![("name", true), ("amount", false)]),
            Comparison::Changed(vec!["amount".into()])
        );
    }

    #[test]
    fn test_eq_comparator() {
        assert!(EqComparator.compare(&(1, "a"), &(1, "a")).unwrap().is_equal());
        assert_eq!(
            EqComparator.compare(&(1, "a"), &(1, "b")).unwrap(),
            Comparison::Changed(vec![])
        );
    }
}
