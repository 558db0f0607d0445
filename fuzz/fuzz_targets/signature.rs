#![no_main]

use jvmscope::metadata::signature::SignatureParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(signature) = std::str::from_utf8(data) {
        if let Ok(parser) = SignatureParser::new(signature) {
            assert_eq!(parser.parameters().count(), parser.num_parameters());
            let _ = parser.returns_reference();
        }
    }
});
