use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use noodles_bgzf as bgzf;
use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::{TempDir, tempdir};

use locidx_core::models::Region;
use locidx_tabix::{Chunk, TabixError, TabixIndexFile, TabixReader, reg2bins};

/// `(bin, [(u, v)])` entries and linear index of one sequence
type SequenceIndex = (Vec<(u32, Vec<(u64, u64)>)>, Vec<u64>);

/// Write `lines` as a single BGZF block, so virtual offsets equal byte offsets.
/// Returns the offset of every line and the offset just past the last one.
fn write_bgzf(path: &Path, lines: &[&str]) -> Result<(Vec<u64>, u64)> {
    let mut writer = bgzf::io::Writer::new(File::create(path)?);
    let mut offsets = Vec::with_capacity(lines.len());
    let mut pos = 0u64;
    for line in lines {
        offsets.push(pos);
        writeln!(writer, "{}", line)?;
        pos += line.len() as u64 + 1;
    }
    writer.finish()?;
    Ok((offsets, pos))
}

/// Serialize a `.tbi` and write it BGZF-compressed, as `tabix` does.
fn write_tbi(
    path: &Path,
    header: [i32; 6],
    names: &[&str],
    sequences: &[SequenceIndex],
) -> Result<()> {
    let mut out = Vec::new();
    out.extend_from_slice(b"TBI\x01");
    out.write_i32::<LittleEndian>(names.len() as i32)?;
    for value in header {
        out.write_i32::<LittleEndian>(value)?;
    }
    let dict: Vec<u8> = names
        .iter()
        .flat_map(|n| n.bytes().chain(std::iter::once(0)))
        .collect();
    out.write_i32::<LittleEndian>(dict.len() as i32)?;
    out.extend_from_slice(&dict);
    for (bins, linear) in sequences {
        out.write_i32::<LittleEndian>(bins.len() as i32)?;
        for (bin, chunks) in bins {
            out.write_u32::<LittleEndian>(*bin)?;
            out.write_i32::<LittleEndian>(chunks.len() as i32)?;
            for (u, v) in chunks {
                out.write_u64::<LittleEndian>(*u)?;
                out.write_u64::<LittleEndian>(*v)?;
            }
        }
        out.write_i32::<LittleEndian>(linear.len() as i32)?;
        for offset in linear {
            out.write_u64::<LittleEndian>(*offset)?;
        }
    }

    let mut writer = bgzf::io::Writer::new(File::create(path)?);
    writer.write_all(&out)?;
    writer.finish()?;
    Ok(())
}

const BED_LINES: [&str; 6] = [
    "#chrom\tstart\tend\tname",
    "chr1\t100\t200\ta",
    "chr1\t150\t300\tb",
    "chr1\t20000\t20100\tc",
    "chr1\t40000\t40100\td",
    "chr2\t50\t60\te",
];

/// A BED file with one record per 16 kb window on chr1 and one on chr2
#[fixture]
fn bed_file() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let data = dir.path().join("peaks.bed.gz");
    let (off, eof) = write_bgzf(&data, &BED_LINES).unwrap();

    let chr1: SequenceIndex = (
        vec![
            (4681, vec![(off[1], off[3])]),
            (4682, vec![(off[3], off[4])]),
            (4683, vec![(off[4], off[5])]),
        ],
        vec![off[1], off[3], off[4]],
    );
    let chr2: SequenceIndex = (vec![(4681, vec![(off[5], eof)])], vec![off[5]]);

    let mut tbi = data.as_os_str().to_owned();
    tbi.push(".tbi");
    write_tbi(
        Path::new(&tbi),
        [0x10000, 1, 2, 3, '#' as i32, 0],
        &["chr1", "chr2"],
        &[chr1, chr2],
    )
    .unwrap();

    (dir, data)
}

fn names(lines: Vec<String>) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.rsplit('\t').next().unwrap_or_default().to_string())
        .collect()
}

#[rstest]
fn test_open_reads_index(bed_file: (TempDir, PathBuf)) {
    let (_dir, data) = bed_file;
    let reader = TabixReader::open(&data).unwrap();
    assert_eq!(reader.sequence_names(), &["chr1".to_string(), "chr2".to_string()]);
    assert_eq!(reader.sequence_id("1"), Some(0));
    assert_eq!(reader.index().unplaced_unmapped(), None);
}

#[rstest]
fn test_query_region(bed_file: (TempDir, PathBuf)) {
    let (_dir, data) = bed_file;
    let mut reader = TabixReader::open(&data).unwrap();

    let lines: Vec<String> = reader
        .query_region("chr1:120-160")
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(lines, vec!["chr1\t100\t200\ta", "chr1\t150\t300\tb"]);
}

#[rstest]
#[case("chr1:20,051-40,050", vec!["c", "d"])]
#[case("chr1:301-1000", vec![])]
#[case("1:200-200", vec!["a", "b"])]
#[case("1:201-201", vec!["b"])]
#[case("chr1:40100-50000", vec!["d"])]
#[case("chr2", vec!["e"])]
#[case("chr9:1-100", vec![])]
fn test_query_regions(
    bed_file: (TempDir, PathBuf),
    #[case] region: &str,
    #[case] expected: Vec<&str>,
) {
    let (_dir, data) = bed_file;
    let mut reader = TabixReader::open(&data).unwrap();
    let lines: Vec<String> = reader
        .query_region(region)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names(lines), expected);
}

#[rstest]
fn test_query_interval_and_tid(bed_file: (TempDir, PathBuf)) {
    let (_dir, data) = bed_file;
    let mut reader = TabixReader::open(&data).unwrap();

    let hits: Vec<String> = reader
        .query_interval(&Region::new("2", 0, 100))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(hits, vec!["chr2\t50\t60\te"]);

    // queries can follow each other on the same reader
    let hits: Vec<String> = reader
        .query(0, 0, 160)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names(hits), vec!["a", "b"]);
}

#[rstest]
fn test_query_chunks_are_merged(bed_file: (TempDir, PathBuf)) {
    let (_dir, data) = bed_file;
    let mut reader = TabixReader::open(&data).unwrap();
    // both windows live in the same BGZF block
    let iter = reader.query(0, 0, 50_000);
    assert_eq!(iter.chunks().len(), 1);
    assert_eq!(iter.count(), 4);
}

#[rstest]
fn test_records(bed_file: (TempDir, PathBuf)) {
    let (_dir, data) = bed_file;
    let mut reader = TabixReader::open(&data).unwrap();

    let lines: Vec<String> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(names(lines), vec!["a", "b", "c", "d", "e"]);

    reader.set_show_header(true);
    let lines: Vec<String> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], BED_LINES[0]);

    // per-iterator override
    let lines: Vec<String> = reader
        .records()
        .show_header(false)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(lines.len(), 5);
}

#[rstest]
fn test_read_line_follows_cursor(bed_file: (TempDir, PathBuf)) {
    let (_dir, data) = bed_file;
    let mut reader = TabixReader::open(&data).unwrap();

    assert_eq!(reader.read_line().unwrap().as_deref(), Some(BED_LINES[0]));
    assert_eq!(reader.read_line().unwrap().as_deref(), Some(BED_LINES[1]));
}

#[rstest]
fn test_with_index_path(bed_file: (TempDir, PathBuf)) {
    let (dir, data) = bed_file;
    let mut tbi = data.as_os_str().to_owned();
    tbi.push(".tbi");
    let moved = dir.path().join("elsewhere.tbi");
    std::fs::rename(&tbi, &moved).unwrap();

    assert!(matches!(TabixReader::open(&data), Err(TabixError::Io(_))));

    let mut reader = TabixReader::with_index_path(&data, &moved).unwrap();
    assert_eq!(reader.query_region("chr2").unwrap().count(), 1);
}

#[rstest]
fn test_index_bins_cover_records(bed_file: (TempDir, PathBuf)) {
    let (_dir, data) = bed_file;
    let mut tbi = data.as_os_str().to_owned();
    tbi.push(".tbi");
    let index = TabixIndexFile::from_path(Path::new(&tbi)).unwrap();
    let chr1 = index.index(0).unwrap();

    for (begin, end) in [(100, 200), (20000, 20100), (40000, 40100)] {
        assert!(
            reg2bins(begin, end).iter().any(|bin| chr1.chunks(*bin).is_some()),
            "no indexed bin for [{begin}, {end})"
        );
    }
}

#[rstest]
fn test_vcf_end_and_meta_lines() -> Result<()> {
    let dir = tempdir()?;
    let data = dir.path().join("calls.vcf.gz");
    let lines = [
        "##fileformat=VCFv4.2",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        "chr1\t100\t.\tA\tT\t.\tPASS\t.",
        "chr1\t500\t.\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL;END=900",
        "chr1\t1000\t.\tACGT\tA\t.\tPASS\t.",
    ];
    let (off, eof) = write_bgzf(&data, &lines)?;
    let chr1: SequenceIndex = (vec![(4681, vec![(off[2], eof)])], vec![off[2]]);
    write_tbi(
        &dir.path().join("calls.vcf.gz.tbi"),
        [2, 1, 2, 0, '#' as i32, 0],
        &["chr1"],
        &[chr1],
    )?;

    let mut reader = TabixReader::open(&data)?;

    // 1-based 800 falls inside the deletion only because of END=
    let hits: Vec<String> = reader.query_region("chr1:800-800")?.collect::<Result<_, _>>()?;
    assert_eq!(hits, vec![lines[3]]);

    // REF length sets the span of the last record
    let hits: Vec<String> = reader.query_region("1:1003-1003")?.collect::<Result<_, _>>()?;
    assert_eq!(hits, vec![lines[4]]);

    let hits: Vec<String> = reader.query_region("chr1:1004-2000")?.collect::<Result<_, _>>()?;
    assert!(hits.is_empty());

    let header: Vec<String> = reader
        .records()
        .show_header(true)
        .take(2)
        .collect::<Result<_, _>>()?;
    assert_eq!(header, vec![lines[0], lines[1]]);
    Ok(())
}

#[rstest]
fn test_malformed_record_is_reported() -> Result<()> {
    let dir = tempdir()?;
    let data = dir.path().join("broken.bed.gz");
    let lines = ["chr1\t10\t20\tok", "chr1\tten\t30\tbad", "chr1\t40\t50\tnever"];
    let (off, eof) = write_bgzf(&data, &lines)?;
    let chr1: SequenceIndex = (vec![(4681, vec![(off[0], eof)])], vec![off[0]]);
    write_tbi(
        &dir.path().join("broken.bed.gz.tbi"),
        [0x10000, 1, 2, 3, '#' as i32, 0],
        &["chr1"],
        &[chr1],
    )?;

    let mut reader = TabixReader::open(&data)?;
    let mut iter = reader.query_region("chr1")?;
    assert_eq!(iter.next().transpose()?.as_deref(), Some(lines[0]));
    assert!(matches!(iter.next(), Some(Err(TabixError::InvalidRecord(_)))));
    // the iterator is exhausted after an error
    assert!(iter.next().is_none());
    Ok(())
}

/// Length of the empty BGZF block that marks end of file
const BGZF_EOF_LEN: usize = 28;

fn voff(block_start: u64, within: u64) -> u64 {
    (block_start << 16) | within
}

/// Write each group of lines as its own BGZF block, returning the compressed
/// start of every block.
fn write_bgzf_blocks(path: &Path, blocks: &[&[&str]]) -> Result<Vec<u64>> {
    let mut out = Vec::new();
    let mut starts = Vec::with_capacity(blocks.len());
    for lines in blocks {
        let mut writer = bgzf::io::Writer::new(Vec::new());
        for line in lines.iter() {
            writeln!(writer, "{}", line)?;
        }
        let mut block = writer.finish()?;
        block.truncate(block.len() - BGZF_EOF_LEN);
        starts.push(out.len() as u64);
        out.extend_from_slice(&block);
    }
    // with nothing buffered, finish only writes the end-of-file block
    out.extend(bgzf::io::Writer::new(Vec::new()).finish()?);
    std::fs::write(path, out)?;
    Ok(starts)
}

const LONG_LINE: &str = "chr1\t40200\t200000\tL";

/// chr1 spread over four BGZF blocks. Block 1 holds a record no bin points at,
/// and the record in block 3 is long enough to live in the 1 Mb bin 73.
#[fixture]
fn multi_block_file() -> (TempDir, PathBuf, Vec<Chunk>) {
    let dir = tempdir().unwrap();
    let data = dir.path().join("blocks.bed.gz");
    let b = write_bgzf_blocks(
        &data,
        &[
            &[BED_LINES[1], BED_LINES[2]],
            &[BED_LINES[3]],
            &[BED_LINES[4]],
            &[LONG_LINE],
        ],
    )
    .unwrap();
    let long_end = voff(b[3], LONG_LINE.len() as u64 + 1);

    let chr1: SequenceIndex = (
        vec![
            (4681, vec![(voff(b[0], 0), voff(b[1], 0))]),
            (4683, vec![(voff(b[2], 0), voff(b[3], 0))]),
            (73, vec![(voff(b[3], 0), long_end)]),
        ],
        vec![voff(b[0], 0), voff(b[2], 0), voff(b[2], 0), voff(b[3], 0)],
    );
    write_tbi(
        &dir.path().join("blocks.bed.gz.tbi"),
        [0x10000, 1, 2, 3, '#' as i32, 0],
        &["chr1"],
        &[chr1],
    )
    .unwrap();

    let expected_chunks = vec![
        Chunk::new(voff(b[0], 0), voff(b[1], 0)),
        Chunk::new(voff(b[2], 0), long_end),
    ];
    (dir, data, expected_chunks)
}

#[rstest]
fn test_query_seeks_between_blocks(multi_block_file: (TempDir, PathBuf, Vec<Chunk>)) {
    let (_dir, data, expected_chunks) = multi_block_file;
    let mut reader = TabixReader::open(&data).unwrap();

    let iter = reader.query(0, 0, 50_000);
    // the chunks in blocks 2 and 3 touch and are coalesced, block 1 is never read
    assert_eq!(iter.chunks(), &expected_chunks[..]);
    let lines: Vec<String> = iter.collect::<Result<_, _>>().unwrap();
    assert_eq!(names(lines), vec!["a", "b", "d", "L"]);
}

#[rstest]
fn test_record_past_end_skips_seek(multi_block_file: (TempDir, PathBuf, Vec<Chunk>)) {
    let (_dir, data, _) = multi_block_file;

    // alone, a query in window 1 seeks to the long record and reads it
    let mut reader = TabixReader::open(&data).unwrap();
    assert_eq!(reader.query(0, 20_000, 20_050).count(), 0);
    assert_eq!(reader.read_line().unwrap(), None);

    // stops on "d", which ends exactly where the bin 73 chunk starts
    let mut reader = TabixReader::open(&data).unwrap();
    assert_eq!(reader.query(0, 39_000, 39_500).count(), 0);

    // "d" starts past 20,050, so the chunk is skipped without a seek
    assert_eq!(reader.query(0, 20_000, 20_050).count(), 0);
    assert_eq!(reader.read_line().unwrap().as_deref(), Some(LONG_LINE));

    // a later query with a wider window still reads everything it needs
    let lines: Vec<String> = reader
        .query(0, 39_000, 50_000)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names(lines), vec!["d", "L"]);
}
