#![no_main]

use jvmscope::metadata::registry::DescriptorRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut parts = text.splitn(3, '\n');
    let (Some(class), Some(name), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return;
    };

    let registry = DescriptorRegistry::new();
    if let Ok(first) = registry.method_descriptor(class, name, signature, false) {
        let second = registry
            .method_descriptor(class, name, signature, false)
            .unwrap();
        assert_eq!(first, second);
    }
});
