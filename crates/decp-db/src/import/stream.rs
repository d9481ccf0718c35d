//! Incremental reader for the record arrays of a DECP document.
//!
//! Documents run to several gigabytes, so they are never loaded whole. A
//! blocking thread walks the document with a `serde_json` deserializer,
//! skipping everything outside the requested dotted path, and sends each array
//! element as its exact source text over a bounded channel. The channel bound
//! is the backpressure: the parser stalls while the importer is busy. Bytes
//! that are not valid UTF-8 are dropped on the way in.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserializer;
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::value::RawValue;
use tokio::sync::mpsc;

use super::ImportError;
use super::utf8::Utf8FilterReader;

/// One array element, verbatim.
pub type RawItem = Box<RawValue>;

type ItemSender = mpsc::Sender<Result<RawItem, serde_json::Error>>;

/// Lazily yields the elements of the array found at a dotted path.
///
/// A path that does not exist in the document yields nothing.
pub struct ItemStream {
    rx: mpsc::Receiver<Result<RawItem, serde_json::Error>>,
}

impl ItemStream {
    /// Stream the array at `item_path` of the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Io` if the file cannot be opened.
    pub fn open(path: &Path, item_path: &str, capacity: usize) -> Result<Self, ImportError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, item_path, capacity))
    }

    /// Stream the array at `item_path` of any JSON reader.
    pub fn from_reader<R>(reader: R, item_path: &str, capacity: usize) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let segments: Vec<String> = item_path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

        std::thread::spawn(move || {
            let mut de = serde_json::Deserializer::from_reader(Utf8FilterReader::new(reader));
            let seed = PathSeed {
                segments: &segments,
                tx: &tx,
            };
            let result = seed.deserialize(&mut de).and_then(|()| de.end());
            if let Err(e) = result {
                if !tx.is_closed() {
                    let _ = tx.blocking_send(Err(e));
                }
            }
        });

        Self { rx }
    }

    /// Next element, `None` once the document is exhausted.
    pub async fn next(&mut self) -> Option<Result<RawItem, ImportError>> {
        self.rx.recv().await.map(|r| r.map_err(ImportError::from))
    }
}

/// Scalars found where an object or array was expected are skipped.
macro_rules! skip_scalars {
    () => {
        fn visit_bool<E: de::Error>(self, _: bool) -> Result<(), E> {
            Ok(())
        }
        fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
            Ok(())
        }
        fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
            Ok(())
        }
        fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
            Ok(())
        }
        fn visit_str<E: de::Error>(self, _: &str) -> Result<(), E> {
            Ok(())
        }
        fn visit_unit<E: de::Error>(self) -> Result<(), E> {
            Ok(())
        }
    };
}

/// Descends one path segment per object level.
struct PathSeed<'a> {
    segments: &'a [String],
    tx: &'a ItemSender,
}

impl<'de> DeserializeSeed<'de> for PathSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        match self.segments.split_first() {
            Some((key, rest)) => deserializer.deserialize_any(ObjectVisitor {
                key,
                rest,
                tx: self.tx,
            }),
            None => deserializer.deserialize_any(ArrayVisitor { tx: self.tx }),
        }
    }
}

struct ObjectVisitor<'a> {
    key: &'a str,
    rest: &'a [String],
    tx: &'a ItemSender,
}

impl<'de> Visitor<'de> for ObjectVisitor<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an object containing '{}'", self.key)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == self.key {
                map.next_value_seed(PathSeed {
                    segments: self.rest,
                    tx: self.tx,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(())
    }

    skip_scalars!();
}

struct ArrayVisitor<'a> {
    tx: &'a ItemSender,
}

impl<'de> Visitor<'de> for ArrayVisitor<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while let Some(item) = seq.next_element::<RawItem>()? {
            if self.tx.blocking_send(Ok(item)).is_err() {
                return Err(de::Error::custom("item receiver dropped"));
            }
        }
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(())
    }

    skip_scalars!();
}
