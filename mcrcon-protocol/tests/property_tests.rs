//! Property-based tests for packet framing.

use bytes::BytesMut;
use mcrcon_protocol::{Decoder, Encoder, Packet, PacketType};
use proptest::prelude::*;

// Property: any (id, type, payload) survives encode then decode
proptest! {
    #[test]
    fn prop_packet_roundtrip(
        id in any::<i32>(),
        packet_type in any::<i32>(),
        payload in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let encoded = Encoder::encode(id, PacketType::from(packet_type), &payload).unwrap();
        let mut buf = BytesMut::from(&encoded[..]);
        let decoded = Packet::decode(&mut buf).unwrap().unwrap();

        prop_assert_eq!(decoded.id, id);
        prop_assert_eq!(decoded.packet_type.as_i32(), packet_type);
        prop_assert_eq!(&decoded.payload[..], &payload[..]);
        prop_assert!(buf.is_empty());
    }
}

// Property: the length field counts every byte after itself
proptest! {
    #[test]
    fn prop_length_field_matches(payload in prop::collection::vec(any::<u8>(), 0..1024)) {
        let encoded = Encoder::encode(1, PacketType::Response, &payload).unwrap();
        let length = i32::from_le_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]);

        prop_assert_eq!(length as usize, encoded.len() - 4);
        prop_assert_eq!(length as usize, 4 + 4 + payload.len() + 2);
    }
}

// Property: decoding is independent of how the stream is chunked
proptest! {
    #[test]
    fn prop_chunked_decoding(
        payload in prop::collection::vec(any::<u8>(), 0..512),
        chunk in 1usize..32,
    ) {
        let encoded = Encoder::encode(9, PacketType::Response, &payload).unwrap();
        let mut decoder = Decoder::new();
        let mut decoded = None;

        for piece in encoded.chunks(chunk) {
            prop_assert!(decoded.is_none());
            decoder.extend(piece);
            decoded = decoder.decode_packet().unwrap();
        }

        let decoded = decoded.unwrap();
        prop_assert_eq!(decoded.id, 9);
        prop_assert_eq!(&decoded.payload[..], &payload[..]);
    }
}
