//! Group key assignment.

use lexis_types::{DateBucket, Document, GroupBy, GroupKey, LexisError, Position, Result};

/// Maps a `(document, position)` pair onto its [`GroupKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupKeyer {
    group_by: GroupBy,
    date_bucket: DateBucket,
    index_width: u64,
}

impl GroupKeyer {
    /// Creates a keyer. `index_width` must be positive; it is only read in
    /// [`GroupBy::Index`] mode.
    pub fn new(group_by: GroupBy, date_bucket: DateBucket, index_width: u64) -> Result<Self> {
        if index_width == 0 {
            return Err(LexisError::InvalidConfig(
                "index_width must be greater than zero".into(),
            ));
        }
        Ok(Self {
            group_by,
            date_bucket,
            index_width,
        })
    }

    /// Grouping mode.
    #[inline(always)]
    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    /// Window width in tokens.
    #[inline(always)]
    pub fn index_width(&self) -> u64 {
        self.index_width
    }

    /// Window index of a global position.
    #[inline(always)]
    pub fn window(&self, position: Position) -> u64 {
        position / self.index_width
    }

    /// Fails on the first document lacking metadata the grouping needs.
    pub fn check_documents(&self, documents: &[Document]) -> Result<()> {
        if !self.group_by.needs_source() {
            return Ok(());
        }
        match documents.iter().find(|d| d.source_id.is_none()) {
            Some(doc) => Err(missing_source(doc)),
            None => Ok(()),
        }
    }

    /// Key of the item at `position` in `doc`.
    ///
    /// Index mode groups by calendar day and window; `date_bucket` only
    /// applies to the date-based modes.
    pub fn key(&self, doc: &Document, position: Position) -> Result<GroupKey> {
        let key = match self.group_by {
            GroupBy::Index => GroupKey::window(doc.date(), self.window(position)),
            GroupBy::Date => GroupKey::date(self.date_bucket.apply(doc.date())),
            GroupBy::Source => GroupKey::source(source_of(doc)?),
            GroupBy::SourceDate => {
                GroupKey::source_date(source_of(doc)?, self.date_bucket.apply(doc.date()))
            }
        };
        Ok(key)
    }
}

fn source_of(doc: &Document) -> Result<&str> {
    doc.source_id.as_deref().ok_or_else(|| missing_source(doc))
}

fn missing_source(doc: &Document) -> LexisError {
    LexisError::UnknownGroupingKey {
        key: "source_id",
        doc_id: doc.id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn doc(source: Option<&str>, day: u32) -> Document {
        let ts = Utc.with_ymd_and_hms(2020, 1, day, 23, 59, 0).unwrap();
        Document::new(format!("d{day}"), source.map(String::from), ts, "text")
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    #[test]
    fn index_mode_splits_at_width() {
        let keyer = GroupKeyer::new(GroupBy::Index, DateBucket::Day, 1000).unwrap();
        let d = doc(None, 1);
        assert_eq!(keyer.key(&d, 999).unwrap(), GroupKey::window(date(1), 0));
        assert_eq!(keyer.key(&d, 1000).unwrap(), GroupKey::window(date(1), 1));
    }

    #[test]
    fn index_mode_ignores_bucket() {
        let keyer = GroupKeyer::new(GroupBy::Index, DateBucket::Month, 10).unwrap();
        assert_eq!(keyer.key(&doc(None, 7), 3).unwrap(), GroupKey::window(date(7), 0));
    }

    #[test]
    fn date_mode_applies_bucket() {
        let keyer = GroupKeyer::new(GroupBy::Date, DateBucket::Month, 1000).unwrap();
        assert_eq!(keyer.key(&doc(None, 17), 0).unwrap(), GroupKey::date(date(1)));
    }

    #[test]
    fn source_modes_require_source() {
        let keyer = GroupKeyer::new(GroupBy::SourceDate, DateBucket::Day, 1000).unwrap();
        assert_eq!(
            keyer.key(&doc(Some("cnn"), 2), 0).unwrap(),
            GroupKey::source_date("cnn", date(2))
        );

        let err = keyer.key(&doc(None, 2), 0).unwrap_err();
        assert!(matches!(
            err,
            LexisError::UnknownGroupingKey { key: "source_id", .. }
        ));

        let docs = [doc(Some("a"), 1), doc(None, 3)];
        match keyer.check_documents(&docs) {
            Err(LexisError::UnknownGroupingKey { doc_id, .. }) => assert_eq!(doc_id, "d3"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn date_mode_tolerates_missing_source() {
        let keyer = GroupKeyer::new(GroupBy::Date, DateBucket::Day, 1000).unwrap();
        assert!(keyer.check_documents(&[doc(None, 1)]).is_ok());
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(
            GroupKeyer::new(GroupBy::Index, DateBucket::Day, 0),
            Err(LexisError::InvalidConfig(_))
        ));
    }
}
