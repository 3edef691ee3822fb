use prometheus::core::{AtomicU64, GenericCounterVec};

pub(crate) type U64CounterVec = GenericCounterVec<AtomicU64>;

/// Create an [`U64CounterVec`] and register it to the given registry.
macro_rules! register_u64_counter_vec {
    ($REGISTRY:expr, $NAME:expr, $HELP:expr, $LABELS:expr) => {{
        let counter = U64CounterVec::new(prometheus::opts!($NAME, $HELP), $LABELS)?;
        $REGISTRY
            .register(Box::new(counter.clone()))
            .map(|_| counter)
    }};
}
