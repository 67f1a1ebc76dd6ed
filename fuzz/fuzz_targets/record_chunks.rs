#![no_main]

use bootline::event::{SourceTag, Timestamp};
use bootline::event_log::Run;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the chunk size, the rest is console output
    let Some((&size, output)) = data.split_first() else {
        return;
    };
    let size = usize::from(size).max(1);

    let mut run = Run::new(0);
    run.record(SourceTag::Trace, Timestamp::from_nanos(0), b"launch");
    for (i, chunk) in output.chunks(size).enumerate() {
        let source = if i % 7 == 6 {
            SourceTag::Library
        } else {
            SourceTag::Appliance
        };
        run.record(source, Timestamp::from_nanos(1_000 * (i as u64 + 1)), chunk);
    }

    for event in run.events() {
        assert!(!event.message.contains('\n'));
        assert!(!event.message.ends_with('\r'));
    }
});
