//! Structured logging helpers.
//!
//! Every ledger log line carries the same field names so that JSON output can
//! be queried consistently:
//! - `component`: ledger component (transfer, registry, service, ...)
//! - `operator`, `from`, `to`: addresses of a transfer
//! - `from_partition`, `to_partition`: partitions of a transfer
//! - `value`: amount moved

/// Log an event with the component field attached.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a transfer-related event with the standard transfer fields.
#[macro_export]
macro_rules! log_transfer_event {
    ($level:ident, $msg:expr, $from:expr, $to:expr, $value:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = "transfer",
            from = %$from,
            to = %$to,
            value = %$value,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a hook dispatch with the hook kind and implementer.
#[macro_export]
macro_rules! log_hook_event {
    ($level:ident, $msg:expr, $hook:expr, $implementer:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = "hooks",
            hook = %$hook,
            implementer = %$implementer,
            $($($field)*,)?
            $msg
        )
    };
}
