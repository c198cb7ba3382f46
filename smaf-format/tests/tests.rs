use std::io::Cursor;

use smaf_core::errors::Error;
use smaf_core::io::{ReadBytes, ReadStream};
use smaf_format::{
    Chunk, ExclusiveMessage, ScoreTrackFormatType, ScoreTrackSequenceType, Smaf, Voice,
};

fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = tag.to_vec();
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

fn score_file() -> Vec<u8> {
    let cnti = chunk(b"CNTI", &[0x00, 0x32, 0x00, 0x03, 0x02]);

    let dch = chunk(b"Dch\x00", b"VN\x00\x03abcST\x00\x02\x92\x85");
    let opda = chunk(b"OPDA", &dch);

    let mut track = vec![0x00, 0x00, 0x02, 0x02, 0x00, 0x00];
    track.extend(chunk(b"Mtsu", &[0xff, 0xf0, 0x02, 0x7d, 0xf7]));
    track.extend(chunk(b"Mtsq", &[0x00, 0x90, 0x40]));
    track.extend(chunk(b"MspI", b"st:0,"));
    let mtr = chunk(b"MTR\x00", &track);

    let mut body = cnti;
    body.extend(opda);
    body.extend(mtr);
    body.extend_from_slice(&[0xbe, 0xef]);

    chunk(b"MMMD", &body)
}

fn fm_voice_exclusive() -> Vec<u8> {
    let mut body = vec![0x43, 0x79, 0x06, 0x7f, 0x01];
    // Bank MSB, bank LSB, program, drum note, FM voice type.
    body.extend_from_slice(&[0x7c, 0x00, 0x05, 0x00, 0x00]);
    // Panpot 15, basic octave 1, algorithm 0.
    body.extend_from_slice(&[0x79, 0x40]);
    body.extend_from_slice(&[0x21; 14]);
    body.push(0xf7);

    let mut stream = vec![0xff, 0xf0, body.len() as u8];
    stream.extend(body);
    stream
}

fn tags(smaf: &Smaf) -> Vec<[u8; 4]> {
    let mut visited = Vec::new();
    smaf.traverse(|chunk: &Chunk| visited.push(chunk.header().tag()));
    visited
}

#[test]
fn decode_score_file() {
    let smaf = Smaf::from_bytes(&score_file()).unwrap();
    assert_eq!(smaf.chunks().len(), 1);

    let file = match &smaf.chunks()[0] {
        Chunk::File(file) => file,
        chunk => panic!("unexpected chunk {:?}", chunk),
    };
    assert_eq!(file.crc, 0xbeef);
    assert_eq!(file.children.len(), 3);

    match &file.children[1].children()[0] {
        Chunk::Data(data) => {
            assert_eq!(data.options.vendor, "abc");
            assert_eq!(data.options.title, "着");
        }
        chunk => panic!("unexpected chunk {:?}", chunk),
    }

    match &file.children[2] {
        Chunk::ScoreTrack(track) => {
            assert_eq!(track.format_type, ScoreTrackFormatType::HandyPhoneStandard);
            assert_eq!(track.sequence_type, ScoreTrackSequenceType::StreamSequence);
        }
        chunk => panic!("unexpected chunk {:?}", chunk),
    }

    assert_eq!(
        tags(&smaf),
        [*b"MMMD", *b"CNTI", *b"OPDA", *b"Dch\x00", *b"MTR\x00", *b"Mtsu", *b"Mtsq", *b"MspI"]
    );
}

#[test]
fn decode_voice_collection() {
    let exvo = chunk(b"EXVO", &fm_voice_exclusive());
    let mut stream = score_file();
    stream.extend(chunk(b"MMMG", &exvo));

    let smaf = Smaf::from_bytes(&stream).unwrap();
    assert_eq!(smaf.chunks().len(), 2);
    assert_eq!(tags(&smaf).len(), 10);

    let exvo = match &smaf.chunks()[1].children()[0] {
        Chunk::MmmgExvo(exvo) => exvo,
        chunk => panic!("unexpected chunk {:?}", chunk),
    };

    let exclusive = exvo.exclusive.as_ref().unwrap();
    assert_eq!(exclusive.length, 27);

    let voice = match &exclusive.message {
        ExclusiveMessage::Voice(voice) => voice,
        msg => panic!("unexpected message {:?}", msg),
    };
    assert_eq!(voice.bank_msb, 0x7c);
    assert_eq!(voice.program, 5);

    match &voice.voice {
        Voice::Fm(fm) => {
            assert_eq!(fm.panpot, 15);
            assert_eq!(fm.basic_octave, 1);
            assert_eq!(fm.lfo, 1);
            assert_eq!(fm.algorithm, 0);
            assert_eq!(fm.operators.len(), 2);
        }
        voice => panic!("unexpected voice {:?}", voice),
    }

    let description = smaf.chunks()[1].describe();
    assert!(description.starts_with("VoiceCollectionChunk: signature=\"MMMG\""));
    assert!(description.contains("\tMMMGEXVOChunk: signature=\"EXVO\""));
}

#[test]
fn decode_from_read_stream() {
    let mut stream = ReadStream::new(Cursor::new(score_file()));
    let smaf = Smaf::read(&mut stream).unwrap();
    assert_eq!(tags(&smaf).len(), 8);
    assert_eq!(stream.pos(), score_file().len() as u64);
}

#[test]
fn truncated_header_after_last_chunk() {
    let mut stream = score_file();
    stream.extend_from_slice(b"MMM");

    match Smaf::from_bytes(&stream) {
        Err(Error::TruncatedHeader { available: 3 }) => (),
        res => panic!("unexpected result {:?}", res),
    }
}

#[test]
fn empty_stream_fails() {
    assert!(matches!(Smaf::from_bytes(&[]), Err(Error::DecodeError(_))));
}

#[test]
fn truncated_seek_phrase_info() {
    let mut stream = chunk(b"MspI", b"st:0,ed:10");
    stream.truncate(12);

    match Smaf::from_bytes(&stream) {
        Err(Error::ShortRead { expected: 10, actual: 4 }) => (),
        res => panic!("unexpected result {:?}", res),
    }
}

#[test]
fn exclusive_size_mismatch() {
    let mut payload = fm_voice_exclusive();
    payload.extend_from_slice(&[0x00, 0x00]);
    let stream = chunk(b"MMMG", &chunk(b"EXVO", &payload));

    match Smaf::from_bytes(&stream) {
        Err(Error::ExclusiveSizeMismatch { remaining: 2 }) => (),
        res => panic!("unexpected result {:?}", res),
    }
}

#[test]
fn tlv_overrun_in_nested_data() {
    let dch = chunk(b"Dch\x00", b"VN\x00\x09abc");
    let mut body = chunk(b"OPDA", &dch);
    body.extend_from_slice(&[0x00, 0x00]);
    let stream = chunk(b"MMMD", &body);

    match Smaf::from_bytes(&stream) {
        Err(Error::TlvOverrun { offset: 0, declared: 13, remaining: 7 }) => (),
        res => panic!("unexpected result {:?}", res),
    }
}

#[test]
fn serialize_tree() {
    let smaf = Smaf::from_bytes(&score_file()).unwrap();
    let json = serde_json::to_value(&smaf).unwrap();

    let file = &json["chunks"][0]["File"];
    assert_eq!(file["header"]["signature"], "MMMD");
    assert_eq!(file["crc"], 0xbeef);

    let track = &file["children"][2]["ScoreTrack"];
    assert_eq!(track["header"]["signature"], "MTR\\x00");
    assert_eq!(track["sequence_type"], "StreamSequence(0x00)");
    assert_eq!(track["timebase_d"], "4ms(0x02)");
}
