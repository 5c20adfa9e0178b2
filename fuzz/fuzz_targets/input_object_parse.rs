#![no_main]

use baremultisig_core::BareMultisigInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a serialized multisig input. from_json must never
    // panic, and anything it accepts must serialize back to an equal input.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(input) = BareMultisigInput::from_json(s) {
            let json = input.to_json().expect("accepted input must serialize");
            let reparsed = BareMultisigInput::from_json(&json).expect("round trip must parse");
            assert_eq!(reparsed, input);
        }
    }
});
