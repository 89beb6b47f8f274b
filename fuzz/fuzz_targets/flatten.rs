#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = overpaint::arbitrary::flatten_invariants(&mut Unstructured::new(data));
});
