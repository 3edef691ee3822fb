use crate::db::db_context::{DbConnection, DbContext};
use crate::db::schema::records;
use crate::errors::{ErrorKind, Result, ResultExt};
use crate::merge::source::{OrderedSource, Streaming};
use crate::models::Record;
use diesel::connection::SimpleConnection;
use diesel::pg::Pg;
use diesel::prelude::*;

/// Reads the `records` table in id order, one keyset page at a time.
///
/// Each page is `WHERE id > last ORDER BY id LIMIT batch_size`, so at most one page is
/// held in memory. All pages are read from a single repeatable-read, read-only
/// transaction, giving the whole run one snapshot. The transaction is rolled back when
/// the source is dropped, on success, error or early exit alike.
pub struct RecordPageSource {
    conn: DbConnection,
    batch_size: i64,
    page: std::vec::IntoIter<Record>,
    last_id: Option<i64>,
    drained: bool,
}

impl RecordPageSource {
    pub fn open(ctx: &DbContext, batch_size: i64) -> Result<RecordPageSource> {
        if batch_size < 1 {
            return Err(ErrorKind::InvalidConfig(format!(
                "Batch size must be positive, got {}",
                batch_size
            ))
            .into());
        }

        let conn = ctx.get_conn()?;
        conn.batch_execute("BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .chain_err(|| "Could not open snapshot transaction")?;
        debug!(target: "merge_sync", "Opened snapshot over records, batch size {}", batch_size);

        Ok(RecordPageSource {
            conn,
            batch_size,
            page: Vec::new().into_iter(),
            last_id: None,
            drained: false,
        })
    }

    fn fetch_page(&mut self) -> Result<()> {
        let mut query: records::BoxedQuery<'_, Pg> = records::table.into_boxed();
        if let Some(last_id) = self.last_id {
            query = query.filter(records::id.gt(last_id));
        }

        let rows = query
            .order(records::id.asc())
            .limit(self.batch_size)
            .load::<Record>(&self.conn)?;
        trace!(target: "merge_sync", "Fetched page of {} records after {:?}", rows.len(), self.last_id);

        if (rows.len() as i64) < self.batch_size {
            self.drained = true;
        }
        self.page = rows.into_iter();

        Ok(())
    }
}

impl OrderedSource for RecordPageSource {
    type Row = Record;

    fn next_row(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.page.next() {
                self.last_id = Some(record.id);
                return Ok(Some(record));
            }
            if self.drained {
                return Ok(None);
            }
            self.fetch_page()?;
        }
    }

    fn streaming(&self) -> Streaming {
        Streaming::Batched {
            batch_size: self.batch_size as usize,
        }
    }
}

impl Drop for RecordPageSource {
    fn drop(&mut self) {
        if let Err(e) = self.conn.batch_execute("ROLLBACK") {
            warn!(target: "merge_sync", "Failed to release snapshot transaction: {}", e);
        }
    }
}
