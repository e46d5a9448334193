//! Triangulations equipped with named laminations and mapping classes
//!
//! An [`EquippedTriangulation`] is the explicit context every operation
//! works in: a surface triangulation together with named curves and
//! named mapping classes. Words over the class names compose
//! right-to-left and a swapcased name denotes the inverse, so `"aB"` is
//! the class of `a` after the inverse of `b`.
//!
//! The module also hosts the line-oriented text format and the
//! top-level classification entry points.

use std::fmt;
use std::sync::Arc;

use log::info;
use rustc_hash::FxHashMap;

use crate::encoding::Encoding;
use crate::error::{AbortSignal, Error, Result};
use crate::invariant::{EigenvectorOracle, InvariantLamination, invariant_lamination};
use crate::isometry::{Isometry, isometries_between};
use crate::lamination::IntegerLamination;
use crate::layered::{LayeredTriangulation, Triangulation3};
use crate::permutation::Permutation;
use crate::splitting::{SplittingSequence, splitting_sequence};
use crate::triangulation::Triangulation;

/// The Nielsen-Thurston class of a mapping class.
#[derive(Debug)]
pub enum NielsenThurstonType {
    /// Finite order; carries the order.
    Periodic(u32),
    /// Preserves a multicurve.
    Reducible,
    /// Carries an invariant lamination with a dilatation above one.
    PseudoAnosov(Box<InvariantLamination>),
}

impl fmt::Display for NielsenThurstonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NielsenThurstonType::Periodic(order) => write!(f, "periodic (order {})", order),
            NielsenThurstonType::Reducible => write!(f, "reducible"),
            NielsenThurstonType::PseudoAnosov(_) => write!(f, "pseudo-Anosov"),
        }
    }
}

/// A triangulation with named laminations and mapping classes.
#[derive(Debug)]
pub struct EquippedTriangulation {
    triangulation: Arc<Triangulation>,
    laminations: Vec<(String, IntegerLamination)>,
    mapping_classes: Vec<(String, Encoding)>,
    index: FxHashMap<String, usize>,
    class_index: FxHashMap<String, usize>,
}

impl EquippedTriangulation {
    /// An empty context over a triangulation.
    pub fn new(triangulation: Arc<Triangulation>) -> Self {
        EquippedTriangulation {
            triangulation,
            laminations: Vec::new(),
            mapping_classes: Vec::new(),
            index: FxHashMap::default(),
            class_index: FxHashMap::default(),
        }
    }

    /// The underlying triangulation.
    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.triangulation
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::assumption(format!(
                "name {:?} must be nonempty ascii letters",
                name
            )));
        }
        let swapped = swapcase(name);
        if self.class_index.contains_key(name) || self.class_index.contains_key(&swapped) {
            return Err(Error::assumption(format!("name {:?} is already in use", name)));
        }
        Ok(())
    }

    /// Register a named lamination.
    pub fn add_lamination(&mut self, name: &str, weights: &[i64]) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(Error::assumption(format!("lamination {:?} already defined", name)));
        }
        let lamination = IntegerLamination::from_weights(&self.triangulation, weights)?;
        self.index.insert(name.to_owned(), self.laminations.len());
        self.laminations.push((name.to_owned(), lamination));
        Ok(())
    }

    /// Look up a named lamination.
    pub fn lamination(&self, name: &str) -> Result<&IntegerLamination> {
        self.index
            .get(name)
            .map(|&i| &self.laminations[i].1)
            .ok_or_else(|| Error::assumption(format!("unknown lamination {:?}", name)))
    }

    /// Register a mapping class directly.
    pub fn add_mapping_class(&mut self, name: &str, encoding: Encoding) -> Result<()> {
        self.check_name(name)?;
        assert!(encoding.is_mapping_class(), "named classes must fix the triangulation");
        self.class_index.insert(name.to_owned(), self.mapping_classes.len());
        self.mapping_classes.push((name.to_owned(), encoding));
        Ok(())
    }

    /// Register the Dehn twist about a named curve.
    pub fn add_twist(&mut self, name: &str, curve: &str, power: i64) -> Result<()> {
        let encoding = self.lamination(curve)?.encode_twist(power)?;
        self.add_mapping_class(name, encoding)
    }

    /// Register the half twist about a named pants-boundary curve.
    pub fn add_halftwist(&mut self, name: &str, curve: &str, power: i64) -> Result<()> {
        let encoding = self.lamination(curve)?.encode_halftwist(power)?;
        self.add_mapping_class(name, encoding)
    }

    /// Register the isometry inducing a permutation of edge indices.
    pub fn add_isometry(&mut self, name: &str, edge_permutation: &Permutation) -> Result<()> {
        let isometry = self.find_isometry(edge_permutation)?;
        self.add_mapping_class(name, Encoding::from_isometry(isometry))
    }

    fn find_isometry(&self, edge_permutation: &Permutation) -> Result<Isometry> {
        isometries_between(&self.triangulation, &self.triangulation)
            .into_iter()
            .find(|iso| &iso.edge_permutation() == edge_permutation)
            .ok_or_else(|| {
                Error::assumption("no isometry realises the requested edge permutation")
            })
    }

    /// Register a composition of already-named classes.
    pub fn add_composition(&mut self, name: &str, word: &str) -> Result<()> {
        let encoding = self.mapping_class(word)?;
        self.add_mapping_class(name, encoding)
    }

    /// The encoding of a word: dot-separated or plainly concatenated
    /// names, composed right-to-left; a swapcased name inverts.
    pub fn mapping_class(&self, word: &str) -> Result<Encoding> {
        let mut encoding = Encoding::identity(Arc::clone(&self.triangulation));
        for token in self.tokenize(word)? {
            let factor = self.resolve(&token)?;
            encoding = encoding.compose(&factor);
        }
        Ok(encoding)
    }

    fn tokenize(&self, word: &str) -> Result<Vec<String>> {
        if word.is_empty() {
            return Err(Error::assumption("empty word"));
        }
        if word.contains('.') {
            return Ok(word.split('.').map(str::to_owned).collect());
        }
        // Plain concatenation: single letters unless a longer name
        // matches greedily.
        let mut tokens = Vec::new();
        let chars: Vec<char> = word.chars().collect();
        let mut at = 0;
        while at < chars.len() {
            let mut taken = None;
            for end in (at + 1..=chars.len()).rev() {
                let candidate: String = chars[at..end].iter().collect();
                if self.class_index.contains_key(&candidate)
                    || self.class_index.contains_key(&swapcase(&candidate))
                {
                    taken = Some((candidate, end));
                    break;
                }
            }
            match taken {
                Some((token, end)) => {
                    tokens.push(token);
                    at = end;
                }
                None => {
                    let rest: String = chars[at..].iter().collect();
                    return Err(Error::assumption(format!(
                        "no mapping class matches at {:?} in word {:?}",
                        rest, word
                    )));
                }
            }
        }
        Ok(tokens)
    }

    fn resolve(&self, token: &str) -> Result<Encoding> {
        if let Some(&i) = self.class_index.get(token) {
            return Ok(self.mapping_classes[i].1.clone());
        }
        let swapped = swapcase(token);
        if let Some(&i) = self.class_index.get(&swapped) {
            return Ok(self.mapping_classes[i].1.inverse());
        }
        Err(Error::assumption(format!("unknown mapping class {:?}", token)))
    }

    /// Classify a word: periodic, reducible, or pseudo-Anosov.
    pub fn nielsen_thurston_type(
        &self,
        word: &str,
        oracle: &dyn EigenvectorOracle,
        abort: Option<AbortSignal<'_>>,
    ) -> Result<NielsenThurstonType> {
        let encoding = self.mapping_class(word)?;
        let order = encoding.order_with(abort)?;
        if order != 0 {
            return Ok(NielsenThurstonType::Periodic(order));
        }
        match invariant_lamination(&encoding, oracle, abort) {
            Ok(invariant) => {
                // A pseudo-Anosov certificate also needs the splitting
                // sequence to close; failure there witnesses
                // reducibility.
                match splitting_sequence(&invariant.lamination, &invariant.dilatation, abort) {
                    Ok(_) => Ok(NielsenThurstonType::PseudoAnosov(Box::new(invariant))),
                    Err(Error::Assumption(_)) => Ok(NielsenThurstonType::Reducible),
                    Err(error) => Err(error),
                }
            }
            Err(Error::Computation(_)) => Ok(NielsenThurstonType::Reducible),
            Err(error) => Err(error),
        }
    }

    /// The invariant lamination and splitting sequence of a
    /// pseudo-Anosov word.
    pub fn splitting_sequence_of(
        &self,
        word: &str,
        oracle: &dyn EigenvectorOracle,
        abort: Option<AbortSignal<'_>>,
    ) -> Result<(InvariantLamination, SplittingSequence)> {
        let encoding = self.mapping_class(word)?;
        if encoding.order_with(abort)? != 0 {
            return Err(Error::assumption("periodic words have no splitting sequence"));
        }
        let invariant = invariant_lamination(&encoding, oracle, abort)?;
        let splitting = splitting_sequence(&invariant.lamination, &invariant.dilatation, abort)?;
        Ok((invariant, splitting))
    }

    /// The layered veering triangulation of the mapping torus of a
    /// pseudo-Anosov word, closed with the chosen closing isometry.
    pub fn bundle(
        &self,
        word: &str,
        isometry_index: usize,
        oracle: &dyn EigenvectorOracle,
        abort: Option<AbortSignal<'_>>,
    ) -> Result<Triangulation3> {
        let (_, splitting) = self.splitting_sequence_of(word, oracle, abort)?;
        if isometry_index >= splitting.closing_isometries.len() {
            return Err(Error::assumption(format!(
                "closing isometry {} requested but only {} exist",
                isometry_index,
                splitting.closing_isometries.len()
            )));
        }
        info!(
            "building bundle for {:?}: {} periodic flips, closing isometry {}",
            word,
            splitting.periodic_flips.len(),
            isometry_index
        );
        let mut layered = LayeredTriangulation::new(&splitting.periodic_triangulation);
        layered.flips(&splitting.periodic_flips);
        layered.close(&splitting.closing_isometries[isometry_index])
    }
}

fn swapcase(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// The text format
// ---------------------------------------------------------------------------

/// Parse the line-oriented surface format: `triangle` records first,
/// then `lamination`, `twist`, `halftwist`, `isometry` and `compose`
/// records. `#` starts a comment and `~k` is a reversed label.
pub fn parse_surface(text: &str) -> Result<EquippedTriangulation> {
    let mut triangles: Vec<[i32; 3]> = Vec::new();
    let mut rest: Vec<(usize, Vec<String>)> = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
        if fields[0] == "triangle" {
            if !rest.is_empty() {
                return Err(parse_error(number, "triangle records must come first"));
            }
            if fields.len() != 4 {
                return Err(parse_error(number, "triangle needs three labels"));
            }
            let mut labels = [0i32; 3];
            for (slot, field) in labels.iter_mut().zip(&fields[1..]) {
                *slot = parse_label(field).ok_or_else(|| parse_error(number, "bad label"))?;
            }
            triangles.push(labels);
        } else {
            rest.push((number, fields));
        }
    }
    if triangles.is_empty() {
        return Err(Error::assumption("no triangle records"));
    }
    let mut equipped = EquippedTriangulation::new(Triangulation::new(triangles));
    for (number, fields) in rest {
        let result = match fields[0].as_str() {
            "lamination" => {
                if fields.len() < 3 {
                    Err(Error::assumption("lamination needs weights"))
                } else {
                    let weights: Option<Vec<i64>> =
                        fields[2..].iter().map(|f| f.parse().ok()).collect();
                    match weights {
                        Some(weights) => equipped.add_lamination(&fields[1], &weights),
                        None => Err(Error::assumption("bad weight")),
                    }
                }
            }
            "twist" | "halftwist" => {
                let power = match fields.len() {
                    3 => Ok(1),
                    4 => fields[3].parse().map_err(|_| Error::assumption("bad power")),
                    _ => Err(Error::assumption("twist needs a name and a curve")),
                };
                power.and_then(|power| {
                    if fields[0] == "twist" {
                        equipped.add_twist(&fields[1], &fields[2], power)
                    } else {
                        equipped.add_halftwist(&fields[1], &fields[2], power)
                    }
                })
            }
            "isometry" => {
                let images: Option<Vec<usize>> =
                    fields[2..].iter().map(|f| f.parse().ok()).collect();
                let zeta = equipped.triangulation().zeta();
                match images {
                    Some(images)
                        if images.len() == zeta
                            && (0..zeta).all(|e| images.contains(&e)) =>
                    {
                        equipped.add_isometry(&fields[1], &Permutation::new(images))
                    }
                    _ => Err(Error::assumption("bad edge permutation")),
                }
            }
            "compose" => {
                if fields.len() != 3 {
                    Err(Error::assumption("compose needs a name and a word"))
                } else {
                    equipped.add_composition(&fields[1], &fields[2])
                }
            }
            other => Err(Error::assumption(format!("unknown record {:?}", other))),
        };
        result.map_err(|e| parse_error(number, &e.to_string()))?;
    }
    Ok(equipped)
}

fn parse_label(field: &str) -> Option<i32> {
    if let Some(stripped) = field.strip_prefix('~') {
        let value: i32 = stripped.parse().ok()?;
        Some(-value - 1)
    } else {
        field.parse().ok()
    }
}

fn parse_error(line: usize, message: &str) -> Error {
    Error::assumption(format!("line {}: {}", line + 1, message))
}

// ---------------------------------------------------------------------------
// Example surfaces
// ---------------------------------------------------------------------------

/// The once-punctured torus with its two twist generators.
pub fn s_1_1() -> EquippedTriangulation {
    let mut equipped =
        EquippedTriangulation::new(Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]]));
    equipped.add_lamination("a", &[1, 1, 0]).expect("valid curve");
    equipped.add_lamination("b", &[0, 1, 1]).expect("valid curve");
    equipped.add_twist("a", "a", 1).expect("twistable");
    equipped.add_twist("b", "b", 1).expect("twistable");
    equipped
}

/// The twice-punctured torus: a square with its corners at one puncture
/// and a second puncture at the centre, joined by four spokes. The
/// named curves are the two horizontal curves on either side of the
/// centre puncture, the vertical curve, and the pants boundary
/// enclosing both punctures.
pub fn s_1_2() -> EquippedTriangulation {
    let mut equipped = EquippedTriangulation::new(Triangulation::from_triangles(&[
        [0, 3, !2],
        [1, 4, !3],
        [!0, 5, !4],
        [!1, 2, !5],
    ]));
    equipped.add_lamination("a", &[0, 1, 1, 1, 0, 0]).expect("valid curve");
    equipped.add_lamination("b", &[1, 0, 0, 1, 1, 0]).expect("valid curve");
    equipped.add_lamination("c", &[0, 1, 0, 0, 1, 1]).expect("valid curve");
    equipped.add_lamination("p", &[2, 2, 0, 2, 2, 2]).expect("valid multicurve");
    equipped.add_twist("a", "a", 1).expect("twistable");
    equipped.add_twist("b", "b", 1).expect("twistable");
    equipped.add_twist("c", "c", 1).expect("twistable");
    equipped
}

/// The four-times-punctured sphere as the boundary of a tetrahedron:
/// four ideal triangles, one puncture per tetrahedron vertex. The curve
/// `x` encircles the first two punctures, `h` is the half twist
/// swapping them and `t` is the full twist about `x`.
pub fn s_0_4() -> EquippedTriangulation {
    let mut equipped = EquippedTriangulation::new(Triangulation::from_triangles(&[
        [3, 5, !4],
        [2, !5, !1],
        [0, 4, !2],
        [1, !3, !0],
    ]));
    equipped.add_lamination("x", &[0, 1, 1, 1, 1, 0]).expect("valid curve");
    equipped.add_twist("t", "x", 1).expect("twistable");
    equipped.add_halftwist("h", "x", 1).expect("half twistable");
    equipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariant::PureOracle;

    #[test]
    fn test_word_tokens() {
        let surface = s_1_1();
        assert!(surface.mapping_class("aB").is_ok());
        assert!(surface.mapping_class("a.B").is_ok());
        assert!(surface.mapping_class("ab").is_ok());
        assert!(surface.mapping_class("x").is_err());
        assert!(surface.mapping_class("").is_err());
    }

    #[test]
    fn test_inverse_by_swapcase() {
        let surface = s_1_1();
        let forward = surface.mapping_class("a").expect("class");
        let inverse = surface.mapping_class("A").expect("class");
        let product = forward.compose(&inverse);
        assert_eq!(product.order(), 1);
    }

    #[test]
    fn test_order_of_aa_inverse() {
        let surface = s_1_1();
        assert_eq!(surface.mapping_class("aA").expect("class").order(), 1);
    }

    #[test]
    fn test_twist_is_reducible() {
        let surface = s_1_1();
        let kind = surface
            .nielsen_thurston_type("a", &PureOracle, None)
            .expect("classification");
        assert!(matches!(kind, NielsenThurstonType::Reducible));
    }

    #[test]
    fn test_ab_is_pseudo_anosov() {
        let surface = s_1_1();
        let kind = surface
            .nielsen_thurston_type("aB", &PureOracle, None)
            .expect("classification");
        match kind {
            NielsenThurstonType::PseudoAnosov(invariant) => {
                assert_eq!(
                    invariant.field.polynomial(),
                    &crate::polynomial::Polynomial::from_coeffs(&[1, -3, 1])
                );
            }
            other => panic!("expected pseudo-Anosov, got {}", other),
        }
    }

    #[test]
    fn test_parse_surface_roundtrip() {
        let text = "
            # the once-punctured torus
            triangle 0 1 2
            triangle ~0 ~1 ~2
            lamination a 1 1 0
            lamination b 0 1 1
            twist a a
            twist b b
            compose w a.B
        ";
        let surface = parse_surface(text).expect("parses");
        assert_eq!(surface.triangulation().zeta(), 3);
        assert!(surface.mapping_class("w").is_ok());
        assert!(surface.mapping_class("W").is_ok());
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse_surface("triangle 0 1\n").expect_err("bad triangle");
        assert!(err.to_string().contains("line 1"));
        let err = parse_surface("triangle 0 1 2\ntriangle ~0 ~1 ~2\nfrobnicate x\n")
            .expect_err("unknown record");
        assert!(err.to_string().contains("line 3"));
    }
}
