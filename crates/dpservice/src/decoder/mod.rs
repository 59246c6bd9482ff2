//! Multi-document decoding with kind lookahead.
//!
//! A single stream may hold many documents of different kinds. The
//! [`KindDecoder`] reads just the `kind` of the next document, rewinds, asks
//! the [`Scheme`] for a record of that kind and decodes the same bytes again
//! into it:
//!
//! ```
//! use dpservice::decoder::{Decoder, Format, KindDecoder};
//! use dpservice::{Object, Scheme};
//!
//! let input = br#"
//! {"kind":"Interface","metadata":{"id":"vm1"},"spec":{"vni":100}}
//! {"kind":"Route","metadata":{"vni":100},"spec":{"prefix":"10.0.0.0/24","nextHop":{"vni":200,"ip":"fc00::1"}}}
//! "#;
//!
//! let scheme = Scheme::with_defaults();
//! let decoder = Decoder::new(&input[..], Format::Json);
//! let objects: Vec<Object> = KindDecoder::new(decoder, &scheme)
//!     .collect::<dpservice::Result<_>>()
//!     .unwrap();
//!
//! assert_eq!(objects[0].kind(), "Interface");
//! assert_eq!(objects[1].kind(), "Route");
//! ```

mod checkpoint;
mod yaml;

pub use checkpoint::CheckpointReader;

use std::io::Read;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{Object, TypeMeta};
use crate::scheme::Scheme;
use crate::{Error, Result};

/// Document format of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Concatenated JSON values.
    Json,
    /// `---` separated YAML documents. JSON documents are valid YAML.
    #[default]
    Yaml,
}

impl Format {
    /// Pick a format from a file extension.
    ///
    /// `json` is JSON, `yaml` and `yml` are YAML. Anything else is left to
    /// [`Decoder::detect`].
    pub fn from_extension(extension: Option<&str>) -> Option<Self> {
        let ext = extension?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Format::Json)
        } else if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Some(Format::Yaml)
        } else {
            None
        }
    }

    /// Guess the format from the start of a stream, then rewind it.
    ///
    /// An object whose first key is quoted, or an empty object, is JSON.
    /// Anything else, flow mappings like `{kind: Nat}` included, is YAML.
    fn sniff<R: Read>(reader: &mut CheckpointReader<R>) -> Result<Self> {
        let mut byte = [0u8; 1];
        let mut in_object = false;
        let format = loop {
            if reader.read(&mut byte)? == 0 {
                break Format::Yaml;
            }
            match (in_object, byte[0]) {
                (_, b) if b.is_ascii_whitespace() => {}
                (false, b'{') => in_object = true,
                (true, b'"' | b'}') => break Format::Json,
                _ => break Format::Yaml,
            }
        };
        reader.rewind();
        Ok(format)
    }
}

/// Decodes successive documents and can step back over the last one.
#[derive(Debug)]
pub struct Decoder<R> {
    reader: CheckpointReader<R>,
    format: Option<Format>,
    decoded: bool,
}

impl<R: Read> Decoder<R> {
    /// Create a decoder reading `format` documents from `reader`.
    pub fn new(reader: R, format: Format) -> Self {
        Self {
            reader: CheckpointReader::new(reader),
            format: Some(format),
            decoded: false,
        }
    }

    /// Create a decoder that guesses the format from the first document.
    ///
    /// Used for stdin and files without a known extension, where a
    /// concatenated JSON stream would not parse as YAML.
    pub fn detect(reader: R) -> Self {
        Self {
            reader: CheckpointReader::new(reader),
            format: None,
            decoded: false,
        }
    }

    /// The stream's format, `None` until a detecting decoder has read.
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    /// Decode the next document into `T`.
    ///
    /// Returns `None` at the end of the stream.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        self.reader.checkpoint();
        self.decoded = false;

        let format = match self.format {
            Some(format) => format,
            None => {
                let format = Format::sniff(&mut self.reader)?;
                debug!(?format, "detected document format");
                self.format = Some(format);
                format
            }
        };

        let doc = match format {
            Format::Json => serde_json::Deserializer::from_reader(&mut self.reader)
                .into_iter::<T>()
                .next()
                .transpose()?,
            Format::Yaml => yaml::read_document(&mut self.reader)?
                .map(serde_json::from_value)
                .transpose()?,
        };

        self.decoded = doc.is_some();
        Ok(doc)
    }

    /// Step back so the last decoded document is read again.
    ///
    /// Only legal directly after a successful [`decode`](Self::decode).
    pub fn undecode(&mut self) -> Result<()> {
        if !self.decoded {
            return Err(Error::UndecodeWithoutDecode);
        }
        self.decoded = false;
        self.reader.rewind();
        Ok(())
    }
}

/// Yields typed [`Object`]s from a stream of mixed-kind documents.
///
/// Iteration stops after the first error.
#[derive(Debug)]
pub struct KindDecoder<'s, R> {
    decoder: Decoder<R>,
    scheme: &'s Scheme,
    failed: bool,
}

impl<'s, R: Read> KindDecoder<'s, R> {
    /// Create a kind decoder resolving kinds through `scheme`.
    pub fn new(decoder: Decoder<R>, scheme: &'s Scheme) -> Self {
        Self {
            decoder,
            scheme,
            failed: false,
        }
    }

    /// Decode the next document into a record of its kind.
    ///
    /// Returns `None` at the end of the stream. Unknown kinds are an error.
    pub fn next_object(&mut self) -> Result<Option<Object>> {
        let Some(meta) = self.decoder.decode::<TypeMeta>()? else {
            return Ok(None);
        };
        self.decoder.undecode()?;

        let mut object = self.scheme.new_by_kind(&meta.kind)?;
        object.decode_from(&mut self.decoder)?;
        debug!(kind = object.kind(), key = %object.key(), "decoded object");
        Ok(Some(object))
    }
}

impl<R: Read> Iterator for KindDecoder<'_, R> {
    type Item = Result<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_object() {
            Ok(Some(object)) => Some(Ok(object)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Interface;

    #[test]
    fn test_undecode_requires_decode() {
        let input = br#"{"kind":"Interface"} {"kind":"Route"}"#;
        let mut decoder = Decoder::new(&input[..], Format::Json);

        assert!(matches!(
            decoder.undecode(),
            Err(Error::UndecodeWithoutDecode)
        ));

        let meta: TypeMeta = decoder.decode().unwrap().unwrap();
        assert_eq!(meta.kind, "Interface");
        decoder.undecode().unwrap();
        assert!(matches!(
            decoder.undecode(),
            Err(Error::UndecodeWithoutDecode)
        ));
        assert!(matches!(
            decoder.undecode(),
            Err(Error::UndecodeWithoutDecode)
        ));
    }

    #[test]
    fn test_undecode_replays_document() {
        let input = b"kind: Interface\nmetadata:\n  id: vm1\n---\nkind: Route\n";
        let mut decoder = Decoder::new(&input[..], Format::Yaml);

        let meta: TypeMeta = decoder.decode().unwrap().unwrap();
        assert_eq!(meta.kind, "Interface");
        decoder.undecode().unwrap();

        let iface: Interface = decoder.decode().unwrap().unwrap();
        assert_eq!(iface.metadata.id, "vm1");

        let next: TypeMeta = decoder.decode().unwrap().unwrap();
        assert_eq!(next.kind, "Route");
        assert!(decoder.decode::<TypeMeta>().unwrap().is_none());
    }

    #[test]
    fn test_undecode_after_end_of_stream() {
        let mut decoder = Decoder::new(&b""[..], Format::Json);
        assert!(decoder.decode::<TypeMeta>().unwrap().is_none());
        assert!(decoder.undecode().is_err());
    }

    #[test]
    fn test_unknown_kind_stops_iteration() {
        let input = br#"{"kind":"Gadget"} {"kind":"Interface"}"#;
        let scheme = Scheme::with_defaults();
        let mut objects = KindDecoder::new(Decoder::new(&input[..], Format::Json), &scheme);

        let err = objects.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::UnknownKind { ref kind } if kind == "Gadget"));
        assert!(objects.next().is_none());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_extension(Some("json")), Some(Format::Json));
        assert_eq!(Format::from_extension(Some("JSON")), Some(Format::Json));
        assert_eq!(Format::from_extension(Some("yml")), Some(Format::Yaml));
        assert_eq!(Format::from_extension(Some("txt")), None);
        assert_eq!(Format::from_extension(None), None);
    }

    #[test]
    fn test_detect_concatenated_json() {
        let input = b"\n  {\"kind\":\"Interface\",\"metadata\":{\"id\":\"vm1\"}}\n{\"kind\":\"Route\"}\n";
        let mut decoder = Decoder::detect(&input[..]);
        assert_eq!(decoder.format(), None);

        let meta: TypeMeta = decoder.decode().unwrap().unwrap();
        assert_eq!(decoder.format(), Some(Format::Json));
        assert_eq!(meta.kind, "Interface");
        decoder.undecode().unwrap();
        let iface: Interface = decoder.decode().unwrap().unwrap();
        assert_eq!(iface.metadata.id, "vm1");
        let next: TypeMeta = decoder.decode().unwrap().unwrap();
        assert_eq!(next.kind, "Route");
        assert!(decoder.decode::<TypeMeta>().unwrap().is_none());
    }

    #[test]
    fn test_detect_yaml() {
        for input in [
            &b"kind: Interface\n"[..],
            b"# objects\nkind: Interface\n",
            b"{kind: Interface}\n",
            b"--- {kind: Interface}\n",
        ] {
            let mut decoder = Decoder::detect(input);
            let meta: TypeMeta = decoder.decode().unwrap().unwrap();
            assert_eq!(decoder.format(), Some(Format::Yaml));
            assert_eq!(meta.kind, "Interface");
        }
    }
}
