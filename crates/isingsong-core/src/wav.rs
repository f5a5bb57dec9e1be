//! 16-bit mono PCM persistence in RIFF/WAVE format.
//!
//! Layout: `RIFF` header, a 16-byte `fmt ` chunk (PCM, 1 channel, 16 bits),
//! then the `data` chunk of little-endian `i16` samples.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{SimError, SimResult};
use crate::synth::Waveform;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const FORMAT_PCM: u16 = 1;
const HEADER_LEN: u32 = 44;

/// Encode quantized samples as a complete WAV stream.
pub fn encode_pcm16<W: Write>(writer: &mut W, samples: &[i16], sample_rate: u32) -> SimResult<()> {
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let data_len = u32::try_from(samples.len() * usize::from(block_align))
        .ok()
        .filter(|len| len.checked_add(HEADER_LEN - 8).is_some())
        .ok_or_else(|| {
            SimError::Shape(format!("{} samples exceed the WAV size limit", samples.len()))
        })?;
    let byte_rate = sample_rate.saturating_mul(u32::from(block_align));

    writer.write_all(b"RIFF")?;
    writer.write_all(&(HEADER_LEN - 8 + data_len).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&FORMAT_PCM.to_le_bytes())?;
    writer.write_all(&CHANNELS.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;
    for s in samples {
        writer.write_all(&s.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Quantize `waveform` and write it to `path`.
pub fn write_wav(path: &Path, waveform: &Waveform) -> SimResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode_pcm16(&mut writer, &waveform.to_pcm16(), waveform.sample_rate)?;
    log::info!(
        "wrote {} samples ({:.2}s) to {}",
        waveform.len(),
        waveform.duration_secs(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
    }

    #[test]
    fn test_header_layout() {
        let mut buf = Vec::new();
        encode_pcm16(&mut buf, &[0, 1, -1, i16::MAX], 44_100).unwrap();
        assert_eq!(buf.len(), 44 + 8);
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(u32_at(&buf, 4), 36 + 8);
        assert_eq!(&buf[8..12], b"WAVE");
        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(u32_at(&buf, 16), 16);
        assert_eq!(u16_at(&buf, 20), 1);
        assert_eq!(u16_at(&buf, 22), 1);
        assert_eq!(u32_at(&buf, 24), 44_100);
        assert_eq!(u32_at(&buf, 28), 88_200);
        assert_eq!(u16_at(&buf, 32), 2);
        assert_eq!(u16_at(&buf, 34), 16);
        assert_eq!(&buf[36..40], b"data");
        assert_eq!(u32_at(&buf, 40), 8);
    }

    #[test]
    fn test_samples_little_endian() {
        let mut buf = Vec::new();
        encode_pcm16(&mut buf, &[-2, 0x1234], 8000).unwrap();
        assert_eq!(&buf[44..], &[0xFE, 0xFF, 0x34, 0x12]);
    }

    #[test]
    fn test_write_wav_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tone.wav");
        let waveform = Waveform {
            samples: vec![0.0, 0.5, 1.0, -1.0],
            sample_rate: 8000,
        };
        write_wav(&path, &waveform).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 8);
        let pcm: Vec<i16> = bytes[44..]
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(pcm, vec![0, 16384, 32767, -32767]);
    }

    #[test]
    fn test_write_to_missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no/such/dir/out.wav");
        let waveform = Waveform {
            samples: vec![0.0],
            sample_rate: 8000,
        };
        assert!(matches!(write_wav(&path, &waveform), Err(SimError::Io(_))));
    }
}
