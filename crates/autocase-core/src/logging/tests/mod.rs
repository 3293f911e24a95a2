use std::sync::Arc;

use crate::logging::{Level, LogSink, MemorySink, TeeSink};

#[test]
fn test_memory_sink_filters_by_level() {
    let sink = MemorySink::new(Level::Info);
    sink.log(Level::Debug, "t", "hidden");
    sink.log(Level::Info, "t", "shown");
    sink.log(Level::Error, "t", "also shown");

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message, "shown");
    assert_eq!(records[1].level, Level::Error);
}

#[test]
fn test_memory_sink_set_level_and_clear() {
    let sink = MemorySink::new(Level::Warn);
    sink.log(Level::Info, "t", "dropped");
    sink.set_level(Level::Trace);
    sink.log(Level::Trace, "t", "kept");
    assert_eq!(sink.records().len(), 1);
    assert!(sink.contents().contains("kept"));

    sink.clear();
    assert!(sink.contents().is_empty());
}

#[test]
fn test_tee_sink_fans_out() {
    let quiet = Arc::new(MemorySink::new(Level::Error));
    let chatty = Arc::new(MemorySink::new(Level::Trace));
    let tee = TeeSink::new(vec![quiet.clone(), chatty.clone()]);

    tee.log(Level::Info, "t", "hello");
    tee.log(Level::Error, "t", "boom");

    assert_eq!(quiet.records().len(), 1);
    assert_eq!(chatty.records().len(), 2);
}

#[test]
fn test_emit_macro_formats_arguments() {
    let sink: Arc<dyn LogSink> = Arc::new(MemorySink::new(Level::Debug));
    crate::logging::emit!(sink, Info, "loaded {} plugins from {}", 3, "dir");
    let memory = MemorySink::new(Level::Debug);
    crate::logging::emit!(&memory, Warn, "value {}", 42);
    assert_eq!(memory.records()[0].message, "value 42");
}
