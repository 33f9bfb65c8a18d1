///
/// Normalize a chromosome name so that `chr1`, `Chr1`, `chromosome1` and `1`
/// all map to the same key.
///
/// Leading/trailing whitespace is trimmed, a leading `chromosome`, `chromo` or
/// `chr` prefix is stripped (case-insensitive, along with a `:` or `_` separator
/// right after it) and the result is upper-cased. A name that is nothing but a
/// prefix keeps its full text.
///
/// ```
/// use locidx_core::utils::normalize_chrom_name;
///
/// assert_eq!(normalize_chrom_name("chr1"), "1");
/// assert_eq!(normalize_chrom_name("ChrX"), "X");
/// assert_eq!(normalize_chrom_name("chrM"), normalize_chrom_name("M"));
/// ```
pub fn normalize_chrom_name(name: &str) -> String {
    let trimmed = name.trim();

    let mut rest = trimmed;
    for prefix in ["chromosome", "chromo", "chr"] {
        if rest.len() > prefix.len()
            && rest.is_char_boundary(prefix.len())
            && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            rest = &rest[prefix.len()..];
            break;
        }
    }

    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('_'))
        .unwrap_or(rest);

    if rest.is_empty() {
        return trimmed.to_uppercase();
    }

    rest.to_uppercase()
}
