use criterion::{black_box, criterion_group, criterion_main, Criterion};
use resolv_proto::{DnsPacket, Header, Name, Question, QueryType, Record};
use std::net::Ipv4Addr;

fn query_packet() -> DnsPacket {
    DnsPacket {
        header: Header::question(38005),
        questions: vec![Question::new(Name::parse("example.com").unwrap(), QueryType::A)],
        ..Default::default()
    }
}

fn response_packet() -> DnsPacket {
    let mut packet = query_packet();
    packet.header = Header::response_from(&packet.header);
    for i in 0..8u8 {
        packet.answers.push(Record::A {
            domain: Name::parse("example.com").unwrap(),
            addr: Ipv4Addr::new(93, 184, 216, i),
            ttl: 300,
        });
    }
    packet
}

fn encoding(mut packet: DnsPacket) {
    let _buffer = packet.create_buffer().unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("encoding query packet", |b| {
        let packet = query_packet();
        b.iter(|| encoding(black_box(packet.clone())))
    });
    c.bench_function("encoding response packet", |b| {
        let packet = response_packet();
        b.iter(|| encoding(black_box(packet.clone())))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
