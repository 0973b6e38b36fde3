#![no_main]

use resolv_proto::{BytePacketBuffer, DnsPacket};

libfuzzer_sys::fuzz_target!(|buffer: BytePacketBuffer| {
    let _ = DnsPacket::try_from(buffer);
});
