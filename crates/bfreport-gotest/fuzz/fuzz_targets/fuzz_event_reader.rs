//! Fuzz target for the `go test -json` event reader
//!
//! Feeds arbitrary bytes to `EventReader`, which must never panic and must
//! stop after its first error.

#![no_main]

use libfuzzer_sys::fuzz_target;

use bfreport_gotest::EventReader;

fuzz_target!(|data: &[u8]| {
    let mut reader = EventReader::new(data);
    let mut saw_error = false;
    for event in reader.by_ref() {
        assert!(!saw_error, "reader yielded after an error");
        saw_error = event.is_err();
    }
    assert!(reader.next().is_none());
});
