
use simple_error::SimpleError;
use std::path::Path;

use crate::util::sequence::reverse_complement;

/// The on-disk formats we accept for sequence collections
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display, strum_macros::EnumString)]
pub enum SequenceFormat {
    #[strum(to_string = "fasta", serialize = "fa")]
    Fasta,
    #[strum(to_string = "fastq", serialize = "fq")]
    Fastq
}

impl SequenceFormat {
    /// Infers the format from a filename, looking through a trailing `.gz` if present.
    /// Returns `None` for anything that is not FASTA/FASTQ.
    pub fn from_path(path: &Path) -> Option<SequenceFormat> {
        let mut extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if extension == "gz" {
            extension = Path::new(path.file_stem()?)
                .extension()?
                .to_str()?
                .to_ascii_lowercase();
        }
        match extension.as_str() {
            "fa" | "fasta" => Some(SequenceFormat::Fasta),
            "fq" | "fastq" => Some(SequenceFormat::Fastq),
            _ => None
        }
    }
}

/// A named nucleotide sequence, optionally carrying per-base Phred qualities.
/// Quality values are stored offset-removed, i.e. q=10 means one error in ten bases.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceRecord {
    /// full header, id plus any description
    name: String,
    /// the nucleotide sequence
    sequence: Vec<u8>,
    /// per-base Phred quality values, present for FASTQ inputs
    quality: Option<Vec<u8>>
}

impl SequenceRecord {
    /// Constructor for quality-less records (FASTA)
    pub fn new(name: String, sequence: Vec<u8>) -> SequenceRecord {
        SequenceRecord {
            name,
            sequence,
            quality: None
        }
    }

    /// Constructor for records with qualities (FASTQ)
    /// # Panics
    /// * if the quality track length does not match the sequence length
    pub fn with_quality(name: String, sequence: Vec<u8>, quality: Vec<u8>) -> SequenceRecord {
        assert_eq!(sequence.len(), quality.len());
        SequenceRecord {
            name,
            sequence,
            quality: Some(quality)
        }
    }

    /// The record id, i.e. the header up to the first whitespace.
    /// Alignment reports refer to sequences by this token.
    pub fn id(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Splits the header into (id, description) for writers that want them apart
    pub fn id_and_description(&self) -> (&str, Option<&str>) {
        match self.name.split_once(char::is_whitespace) {
            Some((id, description)) => (id, Some(description)),
            None => (&self.name, None)
        }
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn quality(&self) -> Option<&[u8]> {
        self.quality.as_deref()
    }

    /// Builds the reverse complement of this record under the same name.
    /// Quality values travel with their bases, so the track is reversed.
    /// # Errors
    /// * if the sequence contains a non-nucleotide character
    pub fn reverse_complement(&self) -> Result<SequenceRecord, SimpleError> {
        let sequence = reverse_complement(&self.sequence)?;
        let quality = self.quality.as_ref().map(|quality| {
            quality.iter().rev().copied().collect()
        });
        Ok(SequenceRecord {
            name: self.name.clone(),
            sequence,
            quality
        })
    }
}
