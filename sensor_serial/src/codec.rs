use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::record::{decode_line, SensorRecord};

/// Newline-delimited sensor lines.
///
/// Decoding yields only lines that pass [`SensorRecord::parse`]; everything
/// else is consumed and skipped.
#[derive(Default, Debug, Clone, Copy)]
pub struct SensorLineCodec {}

impl SensorLineCodec {
    /// Treat whatever is buffered as one complete line and clear the buffer.
    ///
    /// A serial read that times out hands back the bytes it got so far, so
    /// this is what the read loop calls when no terminator showed up in time.
    pub fn take_partial(&mut self, src: &mut BytesMut) -> Option<SensorRecord> {
        if src.is_empty() {
            return None;
        }
        let line = src.split();
        candidate(&line)
    }
}

fn candidate(raw: &[u8]) -> Option<SensorRecord> {
    let line = decode_line(raw);
    let record = SensorRecord::parse(&line);
    if record.is_none() {
        trace!("Skipping line {:?}", line.trim());
    }
    record
}

impl Decoder for SensorLineCodec {
    type Item = SensorRecord;

    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(end) = src.iter().position(|b| *b == b'\n') else {
                return Ok(None);
            };

            let line = src.split_to(end + 1);
            if let Some(record) = candidate(&line) {
                return Ok(Some(record));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }
        Ok(self.take_partial(src))
    }
}

impl Encoder<SensorRecord> for SensorLineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: SensorRecord, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<String>::encode(self, item.to_string(), dst)
    }
}

/// Raw lines, sent as-is. Lets bench tools put malformed input on the wire.
impl Encoder<String> for SensorLineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.contains('\n') {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Line contains a line terminator",
            ));
        }

        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<SensorRecord> {
        let mut codec = SensorLineCodec::default();
        let mut buf = BytesMut::from(input);
        let mut out = vec![];
        while let Some(record) = codec.decode_eof(&mut buf).unwrap() {
            out.push(record);
        }
        out
    }

    #[test]
    fn decodes_complete_lines_in_order() {
        let records = decode_all(b"12:00:01,72,36.5,300\r\n12:00:02,73,36.6,301\n");
        assert_eq!(
            records,
            vec![
                SensorRecord::new("12:00:01", "72", "36.5", "300"),
                SensorRecord::new("12:00:02", "73", "36.6", "301"),
            ]
        );
    }

    #[test]
    fn skips_malformed_lines() {
        let records = decode_all(
            b"12:00:02,,36.5,300\n12:00:03,72,36.5\n\n12:00:04,72,36.5,300,extra\n12:00:05,74,36.7,302\n",
        );
        assert_eq!(records, vec![SensorRecord::new("12:00:05", "74", "36.7", "302")]);
    }

    #[test]
    fn waits_for_terminator() {
        let mut codec = SensorLineCodec::default();
        let mut buf = BytesMut::from(&b"12:00:01,72,36"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"12:00:01,72,36");

        buf.extend_from_slice(b".5,300\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(SensorRecord::new("12:00:01", "72", "36.5", "300"))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_line_is_a_candidate() {
        let mut codec = SensorLineCodec::default();
        let mut buf = BytesMut::from(&b"12:00:01,72,36.5,300"[..]);
        assert_eq!(
            codec.take_partial(&mut buf),
            Some(SensorRecord::new("12:00:01", "72", "36.5", "300"))
        );
        assert!(buf.is_empty());

        let mut buf = BytesMut::from(&b"12:00:01,72"[..]);
        assert_eq!(codec.take_partial(&mut buf), None);
        assert!(buf.is_empty());
        assert_eq!(codec.take_partial(&mut buf), None);
    }

    #[test]
    fn garbled_bytes_are_ignored() {
        let records = decode_all(b"12:00:01,7\xfe2,36.5,300\n");
        assert_eq!(records, vec![SensorRecord::new("12:00:01", "72", "36.5", "300")]);
    }

    #[test]
    fn long_line_split_across_reads_is_judged_whole() {
        let mut codec = SensorLineCodec::default();

        let mut buf = BytesMut::from(&b"a,b"[..]);
        buf.extend_from_slice(&[b'x'; 1100]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"yyy,c,d,e\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());

        let mut buf = BytesMut::from(&[b't'; 1100][..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b",72,36.5,300\n");
        let record = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(record.timestamp().len(), 1100);
        assert_eq!(&record.fields()[1..], ["72", "36.5", "300"]);
    }

    #[test]
    fn encodes_records_and_raw_lines() {
        let mut codec = SensorLineCodec::default();
        let mut buf = BytesMut::new();
        codec
            .encode(SensorRecord::new("12:00:01", "72", "36.5", "300"), &mut buf)
            .unwrap();
        codec.encode("12:00:02,,36.5,300".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"12:00:01,72,36.5,300\n12:00:02,,36.5,300\n");

        assert!(codec.encode("a\nb".to_string(), &mut buf).is_err());
    }
}
