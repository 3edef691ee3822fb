use crate::merge::Side;
use crate::sync::SyncCounts;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Json(::serde_json::Error);
        Metrics(::prometheus::Error);
        Query(::diesel::result::Error) #[cfg(feature = "postgres")];
        Pool(::diesel::r2d2::PoolError) #[cfg(feature = "postgres")];
    }

    errors {
        OrderViolation(side: Side, key: String, previous: String) {
            description("Input is not sorted by key")
            display("Order violation on {} side: key {} arrived after {}", side, key, previous)
        }

        DuplicateKey(side: Side, key: String) {
            description("Input contains a duplicate key")
            display("Duplicate key {} on {} side", key, side)
        }

        AdapterFailure(side: Side) {
            description("Failed to pull the next row from an adapter")
            display("Adapter failure on {} side", side)
        }

        ComparatorFailure(row: String) {
            description("Field comparator failed on a matched pair")
            display("Comparator failed on matched row {}", row)
        }

        SinkFailure(classification: String) {
            description("Action sink rejected an action")
            display("Action sink failed to apply {} action", classification)
        }

        NonStreamingSource(side: Side) {
            description("Adapter buffers its full result set")
            display("The {} adapter does not stream; constant memory cannot be guaranteed", side)
        }

        SyncAborted(partial: SyncCounts) {
            description("Sync run aborted before both sides were exhausted")
            display("Sync aborted, counts are partial and incomplete ({})", partial)
        }

        MalformedRow(line: usize) {
            description("Row could not be decoded")
            display("Malformed row on line {}", line)
        }

        InvalidConfig(t: String) {
            description("Invalid configuration")
            display("Invalid configuration: {}", t)
        }
    }
}
