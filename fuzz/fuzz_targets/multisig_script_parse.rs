#![no_main]

use baremultisig_core::script::{build_locking_script, parse_multisig};
use baremultisig_core::CanonicalKeySet;
use bitcoin::Script;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // parse_multisig must never panic. Anything it recognizes must survive
    // a rebuild in canonical order with the same threshold and key set.
    let script = Script::from_bytes(data);
    if let Some((threshold, keys)) = parse_multisig(script) {
        if let Ok(set) = CanonicalKeySet::new(keys.iter().copied(), threshold) {
            let rebuilt = build_locking_script(&set);
            let (t, k) = parse_multisig(&rebuilt).expect("rebuilt script must parse");
            assert_eq!(t, threshold);
            assert_eq!(k.as_slice(), set.keys());
        }
    }
});
