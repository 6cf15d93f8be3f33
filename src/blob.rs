//! Blob-extraction support: sniffs a blob's real file type from its magic
//! bytes (ignoring whatever the column was declared as) and writes it out
//! under a predictable name.
//!
//! Recognises JPEG/EXIF, MPEG-4 audio, MPEG-4 video, the old Mac OS X
//! bplist format, and MP3 headers, falling back to a generic `.bin`
//! extension. `tempfile` replaces a direct-to-cwd write with a scoped
//! temporary-directory pattern, matching how
//! `hamdaankhalid-persistent-btree-storage-engine` (drawn from the wider
//! example pack) stages output files before committing them to a final
//! location.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

const MPEG4_AUDIO_HEADER: &[u8] = &[0x10, 0x00, 0x00, 0x00, 0x1c, 0x66, 0x74];
const MPEG4_VIDEO_HEADER: &[u8] = &[0x00, 0x00, 0x00, 0x1c, 0x66, 0x74, 0x79, 0x70, 0x6d, 0x70, 0x34, 0x32];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedType {
    Jpeg,
    Mpeg4Audio,
    Mpeg4Video,
    BPlist,
    Mp3,
    Unknown,
}

impl SniffedType {
    pub fn extension(self) -> &'static str {
        match self {
            SniffedType::Jpeg => "jpg",
            SniffedType::Mpeg4Audio => "ma4",
            SniffedType::Mpeg4Video => "mov",
            SniffedType::BPlist => "bplist",
            SniffedType::Mp3 => "mp3",
            SniffedType::Unknown => "bin",
        }
    }
}

/// Sniffs a blob's type from its leading bytes.
pub fn sniff(data: &[u8]) -> SniffedType {
    if data.starts_with(&[0xff, 0xd8, 0xff]) {
        return SniffedType::Jpeg;
    }
    if data.starts_with(MPEG4_AUDIO_HEADER) {
        return SniffedType::Mpeg4Audio;
    }
    if data.starts_with(MPEG4_VIDEO_HEADER) {
        return SniffedType::Mpeg4Video;
    }
    if data.starts_with(b"bplist") {
        return SniffedType::BPlist;
    }
    if data.starts_with(&[0xff, 0xfb]) || data.starts_with(b"ID3") {
        return SniffedType::Mp3;
    }
    SniffedType::Unknown
}

/// Writes `data` to `dir/<table>_<page>_<row_id>_<column_index>.<ext>`,
/// creating `dir` if needed. The blob is staged into a `NamedTempFile` in
/// the same directory first and persisted under its final name only once
/// the write is known to have succeeded, so a partial write never lands
/// under the name a caller would trust. Returns the path written.
pub fn write_blob(
    dir: &Path,
    table: &str,
    page: u32,
    row_id: i64,
    column_index: usize,
    data: &[u8],
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let ext = sniff(data).extension();
    let filename = format!("{table}_{page}_{row_id}_{column_index}.{ext}");
    let path = dir.join(filename);

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(data)?;
    staged.persist(&path).map_err(|e| e.error)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_jpeg_by_magic_bytes() {
        let data = [0xff, 0xd8, 0xff, 0xe0, 0, 0];
        assert_eq!(sniff(&data), SniffedType::Jpeg);
    }

    #[test]
    fn sniffs_mpeg4_video_header() {
        let mut data = MPEG4_VIDEO_HEADER.to_vec();
        data.extend_from_slice(b"mp41isomiso2avc1mp41");
        assert_eq!(sniff(&data), SniffedType::Mpeg4Video);
    }

    #[test]
    fn sniffs_mpeg4_audio_header() {
        let mut data = MPEG4_AUDIO_HEADER.to_vec();
        data.extend_from_slice(b"ypM4A isom0000M4A mp42");
        assert_eq!(sniff(&data), SniffedType::Mpeg4Audio);
    }

    #[test]
    fn sniffs_bplist() {
        assert_eq!(sniff(b"bplist00..."), SniffedType::BPlist);
    }

    #[test]
    fn unrecognised_bytes_are_unknown() {
        assert_eq!(sniff(b"not a known format"), SniffedType::Unknown);
    }

    #[test]
    fn writes_blob_to_named_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_blob(tmp.path(), "photos", 3, 7, 1, &[0xff, 0xd8, 0xff]).unwrap();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "photos_3_7_1.jpg");
        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xd8, 0xff]);
    }
}
