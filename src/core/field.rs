//! Chromosome block encodings and their decoding metadata.
//!
//! Every block of a polysomy genome carries a [`FieldDescriptor`] that fixes
//! its [`Encoding`], the domains of the decision variables it covers, and, for
//! binary blocks, how many bits encode each variable. A [`PopulationLayout`]
//! is the ordered list of these descriptors; concatenating the decoded
//! sub-vectors of every block in layout order yields the phenotype.

use super::{validate_bounds, BoundsError, Chromosome, Gene, VariableBounds, VariableKind};
use rand::seq::index;
use rand::Rng;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Default number of decimal digits resolved by binary blocks built through
/// [`FieldDescriptor::from_variables`].
pub const DEFAULT_BIT_PRECISION: u32 = 4;
/// Longest bit string per variable; keeps every level exactly representable.
pub const MAX_BITS_PER_VARIABLE: usize = 52;

/// Encoding tag of a chromosome block.
///
/// # Examples
/// ```
/// use jeans_psy::Encoding;
/// let encoding: Encoding = "RI".parse().unwrap();
/// assert_eq!(encoding, Encoding::RealInteger);
/// assert!("XY".parse::<Encoding>().is_err());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Each row is a permutation of distinct integers drawn from one domain.
    Permutation,
    /// Each variable is a plain binary or Gray-coded bit string.
    BinaryGray,
    /// Each gene is the real or integral decision value itself.
    RealInteger,
}

impl Encoding {
    /// Short tag used in configuration files and logs.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Permutation => "P",
            Self::BinaryGray => "BG",
            Self::RealInteger => "RI",
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Encoding {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "p" | "permutation" => Ok(Self::Permutation),
            "bg" | "binary" | "gray" => Ok(Self::BinaryGray),
            "ri" | "real" | "real-integer" => Ok(Self::RealInteger),
            _ => Err(LayoutError::UnknownEncoding(value.to_owned())),
        }
    }
}

/// Bit coding used by [`Encoding::BinaryGray`] blocks.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitCoding {
    /// Standard base-2 representation.
    Binary,
    /// Reflected binary code; adjacent levels differ by one bit.
    #[default]
    Gray,
}

/// Errors raised while describing or combining chromosome blocks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// The encoding tag is not one of `P`, `BG` or `RI`.
    #[error("unknown encoding tag {0:?} (expected P, BG or RI)")]
    UnknownEncoding(String),
    /// A layout must contain at least one block.
    #[error("population layout must contain at least one chromosome block")]
    Empty,
    /// A block covers no decision variable.
    #[error("chromosome block {block} covers no decision variables")]
    EmptyBlock {
        /// Index of the empty block.
        block: usize,
    },
    /// Number of declared encodings differs from the number of fields.
    #[error("{encodings} encodings declared but {fields} field descriptors provided")]
    BlockCountMismatch {
        /// Declared encodings.
        encodings: usize,
        /// Provided field descriptors.
        fields: usize,
    },
    /// A field descriptor disagrees with its declared encoding.
    #[error("block {block} declared as {declared} but its field describes {found}")]
    EncodingMismatch {
        /// Index of the block.
        block: usize,
        /// Declared encoding.
        declared: Encoding,
        /// Encoding carried by the field descriptor.
        found: Encoding,
    },
    /// Block widths do not add up to the decision dimension.
    #[error("blocks cover {found} decision variables but {expected} were declared")]
    WidthMismatch {
        /// Expected number of decision variables.
        expected: usize,
        /// Number covered by the blocks.
        found: usize,
    },
    /// A binary variable requested an unusable number of bits.
    #[error("variable {variable} requests {bits} bits (allowed: 1..=52)")]
    InvalidBitLength {
        /// Index of the variable within its block.
        variable: usize,
        /// Requested bit count.
        bits: usize,
    },
    /// All variables of a permutation block must share one domain.
    #[error("permutation variable {variable} does not share the block's domain")]
    PermutationBoundsDiffer {
        /// Index of the variable within its block.
        variable: usize,
    },
    /// The permutation domain cannot supply enough distinct values.
    #[error("permutation domain holds {domain} values but the block is {width} wide")]
    PermutationDomainTooSmall {
        /// Number of distinct admissible values.
        domain: usize,
        /// Number of variables in the block.
        width: usize,
    },
    /// Genome rows do not match the layout.
    #[error("block {block} has malformed genome rows: {reason}")]
    MalformedBlock {
        /// Index of the offending block.
        block: usize,
        /// Description of the mismatch.
        reason: String,
    },
    /// Two populations with different layouts cannot be combined.
    #[error("populations have incompatible chromosome block layouts")]
    IncompatibleLayouts,
    /// Evaluation arrays do not cover every individual.
    #[error("evaluation covers {found} individuals but the population holds {expected}")]
    EvaluationLength {
        /// Population size.
        expected: usize,
        /// Length of the evaluation arrays.
        found: usize,
    },
    /// Wrapper around [`BoundsError`].
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

/// Describes how the genes of one chromosome block map to decision variables.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    encoding: Encoding,
    variables: Vec<VariableBounds>,
    bit_lengths: Vec<usize>,
    coding: BitCoding,
}

impl FieldDescriptor {
    /// Describes a real/integer block holding one gene per variable.
    ///
    /// # Errors
    /// Returns [`LayoutError`] when the block is empty or a domain is invalid.
    pub fn real_integer(variables: Vec<VariableBounds>) -> Result<Self, LayoutError> {
        validate_bounds(&variables)?;
        if variables.is_empty() {
            return Err(LayoutError::EmptyBlock { block: 0 });
        }
        Ok(Self {
            encoding: Encoding::RealInteger,
            variables,
            bit_lengths: Vec::new(),
            coding: BitCoding::default(),
        })
    }

    /// Describes a binary block with explicit bit lengths per variable.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::{BitCoding, FieldDescriptor, VariableBounds};
    /// let field = FieldDescriptor::binary(
    ///     vec![VariableBounds::real(0.0, 1.0), VariableBounds::integer(0.0, 7.0)],
    ///     vec![8, 3],
    ///     BitCoding::Binary,
    /// )
    /// .unwrap();
    /// assert_eq!(field.gene_count(), 11);
    /// assert_eq!(field.width(), 2);
    /// ```
    ///
    /// # Errors
    /// Returns [`LayoutError`] when the lengths disagree, a bit length lies
    /// outside `1..=MAX_BITS_PER_VARIABLE`, or a domain is invalid.
    pub fn binary(
        variables: Vec<VariableBounds>,
        bit_lengths: Vec<usize>,
        coding: BitCoding,
    ) -> Result<Self, LayoutError> {
        validate_bounds(&variables)?;
        if variables.is_empty() {
            return Err(LayoutError::EmptyBlock { block: 0 });
        }
        if bit_lengths.len() != variables.len() {
            return Err(BoundsError::DimensionMismatch {
                expected: variables.len(),
                found: bit_lengths.len(),
            }
            .into());
        }
        if let Some((variable, &bits)) = bit_lengths
            .iter()
            .enumerate()
            .find(|(_, bits)| !(1..=MAX_BITS_PER_VARIABLE).contains(*bits))
        {
            return Err(LayoutError::InvalidBitLength { variable, bits });
        }
        Ok(Self {
            encoding: Encoding::BinaryGray,
            variables,
            bit_lengths,
            coding,
        })
    }

    /// Describes a binary block whose bit lengths resolve `precision` decimal
    /// digits of each continuous variable and every level of each integral
    /// one.
    ///
    /// # Errors
    /// Same conditions as [`FieldDescriptor::binary`].
    pub fn binary_with_precision(
        variables: Vec<VariableBounds>,
        precision: u32,
        coding: BitCoding,
    ) -> Result<Self, LayoutError> {
        validate_bounds(&variables)?;
        let bit_lengths = variables
            .iter()
            .map(|variable| bits_for(variable, precision))
            .collect();
        Self::binary(variables, bit_lengths, coding)
    }

    /// Describes a permutation block; every variable must share one domain.
    ///
    /// Rows hold distinct integers drawn from the shared admissible range,
    /// which may be wider than the block.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::{FieldDescriptor, VariableBounds};
    /// let field = FieldDescriptor::permutation(vec![VariableBounds::integer(1.0, 5.0); 3]).unwrap();
    /// assert_eq!(field.permutation_domain(), Some((1, 5)));
    /// assert!(FieldDescriptor::permutation(vec![VariableBounds::integer(0.0, 1.0); 3]).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns [`LayoutError`] when domains differ or are too small.
    pub fn permutation(variables: Vec<VariableBounds>) -> Result<Self, LayoutError> {
        validate_bounds(&variables)?;
        let first = *variables.first().ok_or(LayoutError::EmptyBlock { block: 0 })?;
        let shared = VariableBounds {
            kind: VariableKind::Integer,
            ..first
        };
        if let Some((variable, _)) = variables.iter().enumerate().find(|(_, candidate)| {
            VariableBounds {
                kind: VariableKind::Integer,
                ..**candidate
            } != shared
        }) {
            return Err(LayoutError::PermutationBoundsDiffer { variable });
        }
        shared.validate(0)?;
        let (low, high) = shared.admissible_range();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let domain = (high - low) as usize + 1;
        if domain < variables.len() {
            return Err(LayoutError::PermutationDomainTooSmall {
                domain,
                width: variables.len(),
            });
        }
        let variables = variables.into_iter().map(|_| shared).collect();
        Ok(Self {
            encoding: Encoding::Permutation,
            variables,
            bit_lengths: Vec::new(),
            coding: BitCoding::default(),
        })
    }

    /// Builds a descriptor for `encoding` with default decoding metadata:
    /// binary blocks use Gray coding at [`DEFAULT_BIT_PRECISION`].
    ///
    /// # Errors
    /// Propagates the constructor errors of the chosen encoding.
    pub fn from_variables(
        encoding: Encoding,
        variables: Vec<VariableBounds>,
    ) -> Result<Self, LayoutError> {
        match encoding {
            Encoding::Permutation => Self::permutation(variables),
            Encoding::BinaryGray => {
                Self::binary_with_precision(variables, DEFAULT_BIT_PRECISION, BitCoding::Gray)
            }
            Encoding::RealInteger => Self::real_integer(variables),
        }
    }

    /// Encoding of the block.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Domains of the decision variables covered by the block.
    #[must_use]
    pub fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }

    /// Number of decision variables decoded from the block.
    #[must_use]
    pub fn width(&self) -> usize {
        self.variables.len()
    }

    /// Number of raw genes per row.
    #[must_use]
    pub fn gene_count(&self) -> usize {
        match self.encoding {
            Encoding::BinaryGray => self.bit_lengths.iter().sum(),
            Encoding::Permutation | Encoding::RealInteger => self.variables.len(),
        }
    }

    /// Bits per variable; empty unless the block is binary.
    #[must_use]
    pub fn bit_lengths(&self) -> &[usize] {
        &self.bit_lengths
    }

    /// Bit coding of binary blocks.
    #[must_use]
    pub fn coding(&self) -> BitCoding {
        self.coding
    }

    /// Inclusive integer domain of permutation blocks.
    #[must_use]
    pub fn permutation_domain(&self) -> Option<(i64, i64)> {
        if self.encoding != Encoding::Permutation {
            return None;
        }
        let (low, high) = self.variables.first()?.admissible_range();
        #[allow(clippy::cast_possible_truncation)]
        Some((low as i64, high as i64))
    }

    /// Checks whether `genes` is a well-formed row for this block.
    #[must_use]
    pub fn is_valid_row(&self, genes: &[Gene]) -> bool {
        if genes.len() != self.gene_count() {
            return false;
        }
        match self.encoding {
            Encoding::BinaryGray => genes.iter().all(|bit| *bit == 0.0 || *bit == 1.0),
            Encoding::RealInteger => genes
                .iter()
                .zip(&self.variables)
                .all(|(gene, variable)| variable.contains(*gene)),
            Encoding::Permutation => {
                let mut seen: Vec<Gene> = genes.to_vec();
                seen.sort_by(f64::total_cmp);
                let distinct = seen.windows(2).all(|pair| pair[0] != pair[1]);
                distinct
                    && genes
                        .iter()
                        .zip(&self.variables)
                        .all(|(gene, variable)| variable.contains(*gene))
            }
        }
    }

    /// Draws a random row for this block.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Chromosome {
        match self.encoding {
            Encoding::RealInteger => Chromosome::random_within(&self.variables, rng),
            Encoding::BinaryGray => Chromosome::new(
                (0..self.gene_count())
                    .map(|_| if rng.gen_bool(0.5) { 1.0 } else { 0.0 })
                    .collect(),
            ),
            Encoding::Permutation => {
                let (low, high) = self.permutation_domain().unwrap_or((0, 0));
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let domain = (high - low) as usize + 1;
                #[allow(clippy::cast_precision_loss)]
                let genes = index::sample(rng, domain, self.width())
                    .into_iter()
                    .map(|offset| (low + offset as i64) as Gene)
                    .collect();
                Chromosome::new(genes)
            }
        }
    }

    /// Decodes one row into its decision sub-vector.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::{BitCoding, FieldDescriptor, VariableBounds};
    /// let field = FieldDescriptor::binary(
    ///     vec![VariableBounds::integer(0.0, 7.0)],
    ///     vec![3],
    ///     BitCoding::Binary,
    /// )
    /// .unwrap();
    /// assert_eq!(field.decode(&[1.0, 0.0, 1.0]), vec![5.0]);
    /// ```
    #[must_use]
    pub fn decode(&self, genes: &[Gene]) -> Vec<f64> {
        match self.encoding {
            Encoding::Permutation | Encoding::RealInteger => genes.to_vec(),
            Encoding::BinaryGray => {
                let mut decoded = Vec::with_capacity(self.variables.len());
                let mut offset = 0;
                for (variable, &bits) in self.variables.iter().zip(&self.bit_lengths) {
                    let end = (offset + bits).min(genes.len());
                    let level = bits_to_level(&genes[offset.min(end)..end], self.coding);
                    decoded.push(quantize(variable, level, bits));
                    offset += bits;
                }
                decoded
            }
        }
    }
}

/// Ordered list of chromosome blocks making up one individual.
///
/// # Examples
/// ```
/// use jeans_psy::{Encoding, PopulationLayout, VariableBounds};
/// let mut variables = vec![VariableBounds::integer(0.0, 7.0); 8];
/// variables.extend(vec![VariableBounds::real(0.0, 1.0); 3]);
/// let layout = PopulationLayout::split(
///     &variables,
///     &[(Encoding::Permutation, 8), (Encoding::RealInteger, 3)],
/// )
/// .unwrap();
/// assert_eq!(layout.len(), 2);
/// assert_eq!(layout.dimensions(), 11);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationLayout {
    blocks: Vec<FieldDescriptor>,
}

impl PopulationLayout {
    /// Creates a layout after checking that every field matches its declared
    /// encoding.
    ///
    /// # Errors
    /// Returns [`LayoutError::BlockCountMismatch`] or
    /// [`LayoutError::EncodingMismatch`] when the declarations disagree.
    pub fn new(encodings: &[Encoding], blocks: Vec<FieldDescriptor>) -> Result<Self, LayoutError> {
        if encodings.len() != blocks.len() {
            return Err(LayoutError::BlockCountMismatch {
                encodings: encodings.len(),
                fields: blocks.len(),
            });
        }
        for (block, (declared, field)) in encodings.iter().zip(&blocks).enumerate() {
            if *declared != field.encoding() {
                return Err(LayoutError::EncodingMismatch {
                    block,
                    declared: *declared,
                    found: field.encoding(),
                });
            }
        }
        Self::from_fields(blocks)
    }

    /// Creates a layout from already built descriptors.
    ///
    /// # Errors
    /// Returns [`LayoutError::Empty`] for an empty list.
    pub fn from_fields(blocks: Vec<FieldDescriptor>) -> Result<Self, LayoutError> {
        if blocks.is_empty() {
            return Err(LayoutError::Empty);
        }
        Ok(Self { blocks })
    }

    /// Splits consecutive decision variables into blocks of the given
    /// encodings and widths, using default decoding metadata.
    ///
    /// # Errors
    /// Returns [`LayoutError::WidthMismatch`] when the widths do not cover
    /// `variables` exactly, or any descriptor construction error.
    pub fn split(
        variables: &[VariableBounds],
        blocks: &[(Encoding, usize)],
    ) -> Result<Self, LayoutError> {
        let covered: usize = blocks.iter().map(|(_, width)| width).sum();
        if covered != variables.len() {
            return Err(LayoutError::WidthMismatch {
                expected: variables.len(),
                found: covered,
            });
        }
        let mut offset = 0;
        let mut fields = Vec::with_capacity(blocks.len());
        for (block, &(encoding, width)) in blocks.iter().enumerate() {
            if width == 0 {
                return Err(LayoutError::EmptyBlock { block });
            }
            let slice = variables[offset..offset + width].to_vec();
            fields.push(FieldDescriptor::from_variables(encoding, slice)?);
            offset += width;
        }
        Self::from_fields(fields)
    }

    /// Field descriptors in chromosome order.
    #[must_use]
    pub fn blocks(&self) -> &[FieldDescriptor] {
        &self.blocks
    }

    /// Number of chromosome blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Layouts are never empty; kept for API symmetry with [`Self::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Encodings in chromosome order.
    #[must_use]
    pub fn encodings(&self) -> Vec<Encoding> {
        self.blocks.iter().map(FieldDescriptor::encoding).collect()
    }

    /// Total number of decoded decision variables.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.blocks.iter().map(FieldDescriptor::width).sum()
    }

    /// Decision-variable domains in phenotype order.
    #[must_use]
    pub fn variables(&self) -> Vec<VariableBounds> {
        self.blocks
            .iter()
            .flat_map(|field| field.variables().iter().copied())
            .collect()
    }
}

fn bits_for(variable: &VariableBounds, precision: u32) -> usize {
    let (low, high) = variable.admissible_range();
    let levels = match variable.kind {
        VariableKind::Integer => high - low + 1.0,
        VariableKind::Real => {
            let scale = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
            (high - low) * scale + 1.0
        }
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bits = levels.log2().ceil().max(1.0) as usize;
    bits.min(MAX_BITS_PER_VARIABLE)
}

fn bits_to_level(bits: &[Gene], coding: BitCoding) -> u64 {
    let mut level = 0_u64;
    let mut previous = false;
    for &gene in bits {
        let raw = gene >= 0.5;
        let bit = match coding {
            BitCoding::Binary => raw,
            BitCoding::Gray => previous ^ raw,
        };
        previous = bit;
        level = (level << 1) | u64::from(bit);
    }
    level
}

/// Maps a bit-string level onto the admissible part of the variable's domain.
#[allow(clippy::cast_precision_loss)]
fn quantize(variable: &VariableBounds, level: u64, bits: usize) -> f64 {
    let levels = (1_u64 << bits) as f64;
    let level = level as f64;
    let position = match (variable.lower_inclusive, variable.upper_inclusive) {
        (true, true) => {
            if levels > 1.0 {
                level / (levels - 1.0)
            } else {
                0.0
            }
        }
        (false, true) => (level + 1.0) / levels,
        (true, false) => level / levels,
        (false, false) => (level + 1.0) / (levels + 1.0),
    };
    variable.clamp(variable.lower + position * (variable.upper - variable.lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn gray_decoding_differs_from_binary() {
        let variables = vec![VariableBounds::integer(0.0, 7.0)];
        let binary = FieldDescriptor::binary(variables.clone(), vec![3], BitCoding::Binary).unwrap();
        let gray = FieldDescriptor::binary(variables, vec![3], BitCoding::Gray).unwrap();
        // Gray 111 is binary 101.
        assert_eq!(binary.decode(&[1.0, 1.0, 1.0]), vec![7.0]);
        assert_eq!(gray.decode(&[1.0, 1.0, 1.0]), vec![5.0]);
        assert_eq!(gray.decode(&[0.0, 0.0, 0.0]), vec![0.0]);
    }

    #[test]
    fn binary_decoding_honours_excluded_bounds() {
        let variable = VariableBounds::real(0.0, 1.0).with_inclusion(false, false);
        let field = FieldDescriptor::binary(vec![variable], vec![2], BitCoding::Binary).unwrap();
        for bits in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
            let value = field.decode(&bits)[0];
            assert!(value > 0.0 && value < 1.0, "{value} escaped (0, 1)");
        }
    }

    #[test]
    fn precision_drives_bit_lengths() {
        let field = FieldDescriptor::binary_with_precision(
            vec![VariableBounds::real(0.0, 1.0), VariableBounds::integer(0.0, 3.0)],
            2,
            BitCoding::Gray,
        )
        .unwrap();
        // 101 levels need 7 bits, 4 levels need 2.
        assert_eq!(field.bit_lengths(), &[7, 2]);
    }

    #[test]
    fn permutation_rows_are_valid() {
        let field = FieldDescriptor::permutation(vec![VariableBounds::integer(0.0, 9.0); 6]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let row = field.sample(&mut rng);
            assert!(field.is_valid_row(row.genes()));
        }
        assert!(!field.is_valid_row(&[0.0, 0.0, 1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn permutation_requires_shared_domain() {
        let err = FieldDescriptor::permutation(vec![
            VariableBounds::integer(0.0, 4.0),
            VariableBounds::integer(0.0, 5.0),
        ])
        .unwrap_err();
        assert_eq!(err, LayoutError::PermutationBoundsDiffer { variable: 1 });
    }

    #[test]
    fn layout_rejects_mismatched_declarations() {
        let field = FieldDescriptor::real_integer(vec![VariableBounds::real(0.0, 1.0)]).unwrap();
        let err = PopulationLayout::new(
            &[Encoding::RealInteger, Encoding::BinaryGray],
            vec![field.clone()],
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::BlockCountMismatch { .. }));
        let err = PopulationLayout::new(&[Encoding::Permutation], vec![field]).unwrap_err();
        assert!(matches!(err, LayoutError::EncodingMismatch { block: 0, .. }));
    }

    #[test]
    fn split_requires_full_coverage() {
        let variables = vec![VariableBounds::real(0.0, 1.0); 4];
        let err = PopulationLayout::split(&variables, &[(Encoding::RealInteger, 3)]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::WidthMismatch {
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn encoding_tags_round_trip_through_display() {
        for encoding in [Encoding::Permutation, Encoding::BinaryGray, Encoding::RealInteger] {
            assert_eq!(encoding.to_string().parse::<Encoding>().unwrap(), encoding);
        }
    }
}
