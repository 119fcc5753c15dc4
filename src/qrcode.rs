//! QR code symbol encoding.
//!
//! This module turns text into a [`QrMatrix`]: a square grid of dark and light
//! modules following the QR Code Model 2 standard. It covers versions 1 to 40,
//! all four error correction levels and the numeric, alphanumeric and byte
//! segment modes. Every step is deterministic, so the same input always yields
//! the same grid.

use crate::error::EncodingError;

/// Encodes `data` at `preferred_version` or the smallest larger version that
/// holds it.
///
/// The error correction level is kept as given. Fails with
/// [`EncodingError::DataTooLong`] when even version 40 is too small, and with
/// [`EncodingError::InvalidVersion`] when `preferred_version` is not in 1..=40.
///
/// # Example
///
/// ```rust
/// use qrtint::qrcode::{encode, QrCodeEcc};
///
/// let qr = encode("http://host/qr/abc123", 6, QrCodeEcc::High).unwrap();
/// assert_eq!(qr.version().value(), 6);
/// assert_eq!(qr.size(), 41);
/// ```
pub fn encode(data: &str, preferred_version: u8, ecl: QrCodeEcc) -> Result<QrMatrix, EncodingError> {
    let minversion = Version::try_from(preferred_version)?;
    QrMatrix::encode_text(data, ecl, minversion, Version::MAX, None, false)
}

/// A QR Code symbol, representing a square grid of dark and light modules.
///
/// Instances are immutable after creation and own their modules.
///
/// # Creation
///
/// - High-level: [`encode`], [`QrMatrix::encode_text`] or [`QrMatrix::encode_binary`].
/// - Mid-level: [`QrMatrix::encode_segments`].
/// - Low-level: [`QrMatrix::encode_codewords`] with ready-made data codewords.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrMatrix {
    version: Version,
    ecl: QrCodeEcc,
    mask: Mask,
    size: i32,
    // Row-major, true = dark.
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes a text string, picking the densest segment mode that fits it.
    ///
    /// The smallest version in `minversion..=maxversion` that holds the data
    /// is chosen. With `boostecl`, the error correction level is raised as
    /// far as it goes without growing the version. `mask` may be `None` to
    /// pick the pattern with the lowest penalty.
    pub fn encode_text(
        text: &str,
        ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool,
    ) -> Result<Self, EncodingError> {
        let segs: Vec<QrSegment> = QrSegment::make_segments(text);
        QrMatrix::encode_segments(&segs, ecl, minversion, maxversion, mask, boostecl)
    }

    /// Encodes arbitrary bytes as a single byte-mode segment.
    pub fn encode_binary(
        data: &[u8],
        ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool,
    ) -> Result<Self, EncodingError> {
        let seg = QrSegment::make_bytes(data);
        QrMatrix::encode_segments(&[seg], ecl, minversion, maxversion, mask, boostecl)
    }

    /// Encodes a list of segments into a symbol.
    pub fn encode_segments(
        segs: &[QrSegment],
        mut ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool,
    ) -> Result<Self, EncodingError> {
        if minversion > maxversion {
            return Err(EncodingError::InvalidVersion(minversion.value()));
        }

        // Find the minimal version number to use
        let mut fitted: Option<(Version, usize)> = None;
        for version in (minversion.value()..=maxversion.value()).filter_map(Version::new) {
            let capacitybits: usize = version.data_codewords(ecl) * 8;
            if let Some(used) = QrSegment::total_bits(segs, version) {
                if used <= capacitybits {
                    fitted = Some((version, used));
                    break;
                }
            }
        }
        let Some((version, datausedbits)) = fitted else {
            return Err(EncodingError::DataTooLong {
                required_bits: QrSegment::raw_bits(segs, maxversion),
                capacity_bits: maxversion.data_codewords(ecl) * 8,
                max_version: maxversion.value(),
                ecl,
            });
        };

        // Increase the error correction level while the data still fits
        for newecl in [QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
            if boostecl && datausedbits <= version.data_codewords(newecl) * 8 {
                ecl = newecl;
            }
        }

        // Concatenate all segments to create the data bit string
        let mut bb = BitBuffer::default();
        for seg in segs {
            bb.append_bits(seg.mode.mode_bits(), 4);
            bb.append_bits(seg.numchars as u32, seg.mode.num_char_count_bits(version));
            bb.0.extend_from_slice(&seg.data);
        }
        debug_assert_eq!(bb.len(), datausedbits);

        // Terminator, then pad to a byte boundary
        let capacitybits: usize = version.data_codewords(ecl) * 8;
        let numzerobits: usize = (capacitybits - bb.len()).min(4);
        bb.append_bits(0, numzerobits as u8);
        let numzerobits: usize = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits as u8);

        // Pad with alternating bytes until data capacity is reached
        for &padbyte in [0xEC, 0x11].iter().cycle() {
            if bb.len() >= capacitybits {
                break;
            }
            bb.append_bits(padbyte, 8);
        }

        let datacodewords: Vec<u8> = bb.to_bytes();
        Ok(QrMatrix::encode_codewords(version, ecl, &datacodewords, mask))
    }

    /// Builds the symbol for a version, level and complete set of data
    /// codewords (padding included, error correction excluded).
    ///
    /// # Panics
    ///
    /// Panics if `datacodewords` does not have exactly
    /// `version.data_codewords(ecl)` bytes.
    pub fn encode_codewords(
        version: Version,
        ecl: QrCodeEcc,
        datacodewords: &[u8],
        mask: Option<Mask>,
    ) -> Self {
        let mut grid = ModuleGrid::new(version);
        grid.draw_function_patterns(ecl);
        let allcodewords: Vec<u8> = add_ecc_and_interleave(datacodewords, version, ecl);
        grid.draw_codewords(&allcodewords);

        let mask: Mask = mask.unwrap_or_else(|| {
            let mut best = Mask(0);
            let mut minpenalty = i32::MAX;
            for candidate in (0u8..8).map(Mask) {
                grid.apply_mask(candidate);
                grid.draw_format_bits(ecl, candidate);
                let penalty: i32 = grid.penalty_score();
                if penalty < minpenalty {
                    best = candidate;
                    minpenalty = penalty;
                }
                grid.apply_mask(candidate); // XOR again to undo
            }
            best
        });
        grid.apply_mask(mask);
        grid.draw_format_bits(ecl, mask);

        QrMatrix {
            version,
            ecl,
            mask,
            size: grid.size,
            modules: grid.modules,
        }
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the side length in modules, `4 * version + 17`.
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Returns the mask pattern applied to the data area.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns `true` for a dark module.
    ///
    /// Coordinates outside the symbol are light, which is what the quiet
    /// zone around it looks like.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size;
        range.contains(&x) && range.contains(&y) && self.modules[(y * self.size + x) as usize]
    }

    /// Number of dark modules in the symbol.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&dark| dark).count()
    }
}

/// Working state while a symbol is drawn. Tracks which modules belong to
/// function patterns so data placement and masking can skip them.
struct ModuleGrid {
    version: Version,
    size: i32,
    modules: Vec<bool>,
    isfunction: Vec<bool>,
}

impl ModuleGrid {
    fn new(version: Version) -> Self {
        let size = version.size() as i32;
        let count = (size * size) as usize;
        Self {
            version,
            size,
            modules: vec![false; count],
            isfunction: vec![false; count],
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.size + x) as usize
    }

    fn module(&self, x: i32, y: i32) -> bool {
        self.modules[self.index(x, y)]
    }

    fn set_function_module(&mut self, x: i32, y: i32, isdark: bool) {
        let i = self.index(x, y);
        self.modules[i] = isdark;
        self.isfunction[i] = true;
    }

    fn draw_function_patterns(&mut self, ecl: QrCodeEcc) {
        let size: i32 = self.size;

        // Timing patterns
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        // Finder patterns and their separators
        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        // Alignment patterns, skipping the three corners taken by finders
        let alignpatpos: Vec<i32> = self.version.alignment_pattern_positions();
        let numalign: usize = alignpatpos.len();
        for i in 0..numalign {
            for j in 0..numalign {
                let corner = (i == 0 && j == 0)
                    || (i == 0 && j == numalign - 1)
                    || (i == numalign - 1 && j == 0);
                if !corner {
                    self.draw_alignment_pattern(alignpatpos[i], alignpatpos[j]);
                }
            }
        }

        // Reserve the format area with a placeholder mask, real bits come later
        self.draw_format_bits(ecl, Mask(0));
        self.draw_version();
    }

    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4..=4 {
            for dx in -4..=4 {
                let xx: i32 = x + dx;
                let yy: i32 = y + dy;
                if (0..self.size).contains(&xx) && (0..self.size).contains(&yy) {
                    let dist: i32 = dx.abs().max(dy.abs());
                    self.set_function_module(xx, yy, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2..=2 {
            for dx in -2..=2 {
                self.set_function_module(x + dx, y + dy, dx.abs().max(dy.abs()) != 1);
            }
        }
    }

    fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        let bits: u32 = {
            let data = u32::from((ecl.format_bits() << 3) | mask.value());
            let mut rem: u32 = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            ((data << 10) | rem) ^ 0x5412
        };
        debug_assert_eq!(bits >> 15, 0);

        // First copy, wrapped around the top-left finder
        for i in 0..6 {
            self.set_function_module(8, i, get_bit(bits, i));
        }
        self.set_function_module(8, 7, get_bit(bits, 6));
        self.set_function_module(8, 8, get_bit(bits, 7));
        self.set_function_module(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set_function_module(14 - i, 8, get_bit(bits, i));
        }

        // Second copy, split between the other two finders
        let size: i32 = self.size;
        for i in 0..8 {
            self.set_function_module(size - 1 - i, 8, get_bit(bits, i));
        }
        for i in 8..15 {
            self.set_function_module(8, size - 15 + i, get_bit(bits, i));
        }
        self.set_function_module(8, size - 8, true); // Always dark
    }

    fn draw_version(&mut self) {
        let ver = u32::from(self.version.value());
        if ver < 7 {
            return;
        }
        let bits: u32 = {
            let mut rem: u32 = ver;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
            }
            (ver << 12) | rem
        };
        debug_assert_eq!(bits >> 18, 0);

        for i in 0..18 {
            let bit: bool = get_bit(bits, i);
            let a: i32 = self.size - 11 + i % 3;
            let b: i32 = i / 3;
            self.set_function_module(a, b, bit);
            self.set_function_module(b, a, bit);
        }
    }

    fn draw_codewords(&mut self, data: &[u8]) {
        debug_assert_eq!(data.len(), self.version.raw_data_modules() / 8);
        let size: i32 = self.size;
        let totalbits: usize = data.len() * 8;
        let mut i: usize = 0;
        // Two-module wide columns, right to left, zigzagging vertically
        let mut right: i32 = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            for vert in 0..size {
                for j in 0..2 {
                    let x: i32 = right - j;
                    let upward: bool = ((right + 1) & 2) == 0;
                    let y: i32 = if upward { size - 1 - vert } else { vert };
                    let idx = self.index(x, y);
                    if !self.isfunction[idx] && i < totalbits {
                        self.modules[idx] = get_bit(u32::from(data[i >> 3]), 7 - (i & 7) as i32);
                        i += 1;
                    }
                    // Remainder bits stay light until masked
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, totalbits);
    }

    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = self.index(x, y);
                if self.isfunction[idx] {
                    continue;
                }
                let invert: bool = match mask.value() {
                    0 => (x + y) % 2 == 0,
                    1 => y % 2 == 0,
                    2 => x % 3 == 0,
                    3 => (x + y) % 3 == 0,
                    4 => (x / 3 + y / 2) % 2 == 0,
                    5 => x * y % 2 + x * y % 3 == 0,
                    6 => (x * y % 2 + x * y % 3) % 2 == 0,
                    _ => ((x + y) % 2 + x * y % 3) % 2 == 0,
                };
                self.modules[idx] ^= invert;
            }
        }
    }

    fn penalty_score(&self) -> i32 {
        let mut result: i32 = 0;
        let size: i32 = self.size;

        // Adjacent modules in row having same color, and finder-like patterns
        for y in 0..size {
            result += self.line_penalty(|i| self.module(i, y));
        }
        // Adjacent modules in column having same color, and finder-like patterns
        for x in 0..size {
            result += self.line_penalty(|i| self.module(x, i));
        }

        // 2*2 blocks of modules having same color
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color: bool = self.module(x, y);
                if color == self.module(x + 1, y)
                    && color == self.module(x, y + 1)
                    && color == self.module(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Balance of dark and light modules
        let dark = self.modules.iter().filter(|&&dark| dark).count() as i32;
        let total: i32 = size * size;
        let k: i32 = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result + k * PENALTY_N4
    }

    fn line_penalty(&self, module_at: impl Fn(i32) -> bool) -> i32 {
        let mut result: i32 = 0;
        let mut runcolor = false;
        let mut runlen: i32 = 0;
        let mut runhistory = FinderPenalty::new(self.size);
        for i in 0..self.size {
            let color: bool = module_at(i);
            if color == runcolor {
                runlen += 1;
                if runlen == 5 {
                    result += PENALTY_N1;
                } else if runlen > 5 {
                    result += 1;
                }
            } else {
                runhistory.add_history(runlen);
                if !runcolor {
                    result += runhistory.count_patterns() * PENALTY_N3;
                }
                runcolor = color;
                runlen = 1;
            }
        }
        result + runhistory.terminate_and_count(runcolor, runlen) * PENALTY_N3
    }
}

/// Splits data into blocks, appends Reed-Solomon ECC to each and
/// interleaves the result in the order the symbol stores codewords.
fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
    assert_eq!(data.len(), ver.data_codewords(ecl), "Illegal argument");
    let numblocks: usize = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
    let blockecclen: usize = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
    let rawcodewords: usize = ver.raw_data_modules() / 8;
    let numshortblocks: usize = numblocks - rawcodewords % numblocks;
    let shortblocklen: usize = rawcodewords / numblocks;

    let rs = ReedSolomonGenerator::new(blockecclen);
    let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(numblocks);
    let mut k: usize = 0;
    for i in 0..numblocks {
        let datlen: usize = shortblocklen - blockecclen + usize::from(i >= numshortblocks);
        let mut dat: Vec<u8> = data[k..k + datlen].to_vec();
        k += datlen;
        let ecc: Vec<u8> = rs.compute_remainder(&dat);
        if i < numshortblocks {
            dat.push(0); // Placeholder so all blocks line up, skipped below
        }
        dat.extend_from_slice(&ecc);
        blocks.push(dat);
    }

    let mut result: Vec<u8> = Vec::with_capacity(rawcodewords);
    for i in 0..=shortblocklen {
        for (j, block) in blocks.iter().enumerate() {
            if i != shortblocklen - blockecclen || j >= numshortblocks {
                result.push(block[i]);
            }
        }
    }
    debug_assert_eq!(result.len(), rawcodewords);
    result
}

fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

struct ReedSolomonGenerator {
    divisor: Vec<u8>,
}

impl ReedSolomonGenerator {
    /// Builds the generator polynomial for `degree` ECC codewords. Coefficients
    /// are stored highest to lowest power, the leading 1 left implicit.
    fn new(degree: usize) -> Self {
        assert!((1..=255).contains(&degree), "Degree out of range");
        let mut divisor: Vec<u8> = vec![0; degree - 1];
        divisor.push(1);
        // Multiply by (x - r^0) * (x - r^1) * ... * (x - r^{degree-1})
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = Self::multiply(divisor[j], root);
                if j + 1 < divisor.len() {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = Self::multiply(root, 0x02);
        }
        Self { divisor }
    }

    fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result: Vec<u8> = vec![0; self.divisor.len()];
        for b in data {
            let factor: u8 = b ^ result.remove(0);
            result.push(0);
            for (x, &y) in result.iter_mut().zip(self.divisor.iter()) {
                *x ^= Self::multiply(y, factor);
            }
        }
        result
    }

    /// Product of two field elements modulo x^8 + x^4 + x^3 + x^2 + 1.
    fn multiply(x: u8, y: u8) -> u8 {
        let mut z: u8 = 0;
        for i in (0..8).rev() {
            z = (z << 1) ^ ((z >> 7) * 0x1D);
            z ^= ((y >> i) & 1) * x;
        }
        z
    }
}

struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: i32) -> Self {
        Self {
            qr_size: size,
            run_history: [0; 7],
        }
    }

    // Pushes the given value to the front and drops the last value.
    fn add_history(&mut self, mut currentrunlength: i32) {
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size; // Light border before the first run
        }
        let len: usize = self.run_history.len();
        self.run_history.copy_within(0..len - 1, 1);
        self.run_history[0] = currentrunlength;
    }

    // Can only be called right after a light run is added. Returns 0, 1 or 2.
    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        debug_assert!(n <= self.qr_size * 3);
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n)
            + i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            // Terminate dark run
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size; // Light border after the last run
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    // Version: (index 0 is padding)
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// Index into the capacity tables, in the range 0 to 3.
    fn ordinal(self) -> usize {
        match self {
            QrCodeEcc::Low => 0,
            QrCodeEcc::Medium => 1,
            QrCodeEcc::Quartile => 2,
            QrCodeEcc::High => 3,
        }
    }

    /// The 2-bit value stored in the format information.
    pub fn format_bits(self) -> u8 {
        match self {
            QrCodeEcc::Low => 1,
            QrCodeEcc::Medium => 0,
            QrCodeEcc::Quartile => 3,
            QrCodeEcc::High => 2,
        }
    }
}

/// A segment of data in a QR code, in numeric, alphanumeric or byte mode.
///
/// Segments are immutable and built with [`QrSegment::make_numeric`],
/// [`QrSegment::make_alphanumeric`] or [`QrSegment::make_bytes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: Vec<bool>,
}

impl QrSegment {
    /// Creates a byte-mode segment. Any data is acceptable.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(data.len() * 8));
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        QrSegment {
            mode: QrSegmentMode::Byte,
            numchars: data.len(),
            data: bb.0,
        }
    }

    /// Creates a numeric-mode segment, or `None` if `text` has anything other
    /// than the digits 0 to 9.
    pub fn make_numeric(text: &str) -> Option<Self> {
        if !QrSegment::is_numeric(text) {
            return None;
        }
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 3 + (text.len() + 2) / 3));
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            // 1 or 2 digits remaining
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Some(QrSegment {
            mode: QrSegmentMode::Numeric,
            numchars: text.len(),
            data: bb.0,
        })
    }

    /// Creates an alphanumeric-mode segment, or `None` if `text` leaves the
    /// set 0-9, A-Z (uppercase), space, `$`, `%`, `*`, `+`, `-`, `.`, `/`, `:`.
    pub fn make_alphanumeric(text: &str) -> Option<Self> {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 5 + (text.len() + 1) / 2));
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for c in text.chars() {
            let i = ALPHANUMERIC_CHARSET.find(c)?;
            accumdata = accumdata * 45 + i as u32;
            accumcount += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            // 1 character remaining
            bb.append_bits(accumdata, 6);
        }
        Some(QrSegment {
            mode: QrSegmentMode::Alphanumeric,
            numchars: text.chars().count(),
            data: bb.0,
        })
    }

    /// Wraps `text` in the densest single segment able to hold it. Empty text
    /// gives no segments at all.
    pub fn make_segments(text: &str) -> Vec<Self> {
        if text.is_empty() {
            return Vec::new();
        }
        let seg = QrSegment::make_numeric(text)
            .or_else(|| QrSegment::make_alphanumeric(text))
            .unwrap_or_else(|| QrSegment::make_bytes(text.as_bytes()));
        vec![seg]
    }

    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// Bits needed for `segs` at `version`, or `None` when a character count
    /// overflows its field.
    fn total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits: u8 = seg.mode.num_char_count_bits(version);
            if seg.numchars >= 1usize << ccbits {
                return None;
            }
            result = result.checked_add(4 + usize::from(ccbits) + seg.data.len())?;
        }
        Some(result)
    }

    /// Bits needed for `segs` ignoring character count overflow, for error
    /// reporting.
    fn raw_bits(segs: &[Self], version: Version) -> usize {
        segs.iter()
            .map(|seg| 4 + usize::from(seg.mode.num_char_count_bits(version)) + seg.data.len())
            .fold(0, usize::saturating_add)
    }

    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Describes how a segment's data bits are interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl QrSegmentMode {
    // Returns an unsigned 4-bit integer value (range 0 to 15)
    // representing the mode indicator bits for this mode object.
    fn mode_bits(self) -> u32 {
        match self {
            QrSegmentMode::Numeric => 0x1,
            QrSegmentMode::Alphanumeric => 0x2,
            QrSegmentMode::Byte => 0x4,
        }
    }

    // Returns the bit width of the character count field for a segment in this mode
    // in a QR Code at the given version number. The result is in the range [0, 16].
    fn num_char_count_bits(self, ver: Version) -> u8 {
        let widths: [u8; 3] = match self {
            QrSegmentMode::Numeric => [10, 12, 14],
            QrSegmentMode::Alphanumeric => [9, 11, 13],
            QrSegmentMode::Byte => [8, 16, 16],
        };
        widths[usize::from((ver.value() + 7) / 17)]
    }
}

/// An appendable sequence of bits (0s and 1s).
#[derive(Clone, Debug, Default)]
struct BitBuffer(Vec<bool>);

impl BitBuffer {
    fn len(&self) -> usize {
        self.0.len()
    }

    /// Appends the `len` low bits of `val`, most significant first.
    fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && val >> len == 0, "Value out of range");
        self.0.extend((0..i32::from(len)).rev().map(|i| get_bit(val, i)));
    }

    /// Packs the bits big-endian into bytes. The length must be a multiple of 8.
    fn to_bytes(&self) -> Vec<u8> {
        debug_assert_eq!(self.len() % 8, 0);
        self.0
            .chunks(8)
            .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit)))
            .collect()
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Returns the version for `ver`, or `None` outside [1, 40].
    pub const fn new(ver: u8) -> Option<Self> {
        if Version::MIN.0 <= ver && ver <= Version::MAX.0 {
            Some(Self(ver))
        } else {
            None
        }
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length of the symbol in modules.
    pub const fn size(self) -> usize {
        self.0 as usize * 4 + 17
    }

    /// Number of data bits that fit in a symbol of this version, after all
    /// function modules are excluded. Includes remainder bits, so it might
    /// not be a multiple of 8.
    pub fn raw_data_modules(self) -> usize {
        let ver = usize::from(self.0);
        let mut result: usize = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let numalign: usize = ver / 7 + 2;
            result -= (25 * numalign - 10) * numalign - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        debug_assert!((208..=29648).contains(&result));
        result
    }

    /// Number of 8-bit data codewords (excluding ECC) at this version and level.
    pub fn data_codewords(self, ecl: QrCodeEcc) -> usize {
        self.raw_data_modules() / 8
            - table_get(&ECC_CODEWORDS_PER_BLOCK, self, ecl)
                * table_get(&NUM_ERROR_CORRECTION_BLOCKS, self, ecl)
    }

    /// Number of error correction blocks and ECC codewords per block.
    pub fn ecc_blocks(self, ecl: QrCodeEcc) -> (usize, usize) {
        (
            table_get(&NUM_ERROR_CORRECTION_BLOCKS, self, ecl),
            table_get(&ECC_CODEWORDS_PER_BLOCK, self, ecl),
        )
    }

    /// Largest byte-mode payload this version holds at `ecl`.
    pub fn byte_capacity(self, ecl: QrCodeEcc) -> usize {
        let overhead: usize = 4 + usize::from(QrSegmentMode::Byte.num_char_count_bits(self));
        (self.data_codewords(ecl) * 8 - overhead) / 8
    }

    /// Centre coordinates of the alignment patterns, ascending. Used on both
    /// axes; empty for version 1.
    pub fn alignment_pattern_positions(self) -> Vec<i32> {
        let ver = i32::from(self.0);
        if ver == 1 {
            return Vec::new();
        }
        let numalign: i32 = ver / 7 + 2;
        let step: i32 = if ver == 32 {
            26
        } else {
            (ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2) * 2
        };
        let size = self.size() as i32;
        let mut result: Vec<i32> = (0..numalign - 1).map(|i| size - 7 - i * step).collect();
        result.push(6);
        result.reverse();
        result
    }
}

impl TryFrom<u8> for Version {
    type Error = EncodingError;

    fn try_from(ver: u8) -> Result<Self, Self::Error> {
        Version::new(ver).ok_or(EncodingError::InvalidVersion(ver))
    }
}

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Returns the mask for `mask`, or `None` above 7.
    pub const fn new(mask: u8) -> Option<Self> {
        if mask <= 7 {
            Some(Self(mask))
        } else {
            None
        }
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }
}

// Returns true iff the i'th bit of x is set to 1.
fn get_bit(x: u32, i: i32) -> bool {
    (x >> i) & 1 != 0
}
