//! Layered veering triangulations of mapping tori
//!
//! Orientation conventions follow SnapPy's kernel (kernel_typedefs.h
//! and peripheral_curves.c).
//!
//! A [`LayeredTriangulation`] starts as two copies of a surface
//! triangulation joined by a block of paired tetrahedra, one pair per
//! triangle. Each 2D flip inserts one tetrahedron between the core and
//! the upper boundary, with veering labels recording the handedness of
//! the flip. Closing glues the top of the stack to the bottom through a
//! combinatorial isometry, assigns cusps and installs the peripheral
//! curves: a meridian by the turn-alternating walk around each cusp and
//! a longitude by climbing until the meridian is found and following it
//! home.

use std::fmt;
use std::sync::Arc;

use log::debug;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Error, Result};
use crate::isometry::Isometry;
use crate::permutation::Perm4;
use crate::triangulation::Triangulation;

new_key_type! {
    /// Stable handle of a tetrahedron in its arena.
    pub struct TetKey;
}

/// The veer of a tetrahedron edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Veering {
    /// Left-veering.
    Left,
    /// Right-veering.
    Right,
}

/// The three vertices on face `side`.
pub(crate) const VERTICES_MEETING: [[usize; 3]; 4] =
    [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// Index of the unordered vertex pair `{a, b}` in the fixed edge order
/// `01 02 03 12 13 23`.
fn edge_index(a: usize, b: usize) -> usize {
    let (a, b) = if a < b { (a, b) } else { (b, a) };
    match (a, b) {
        (0, 1) => 0,
        (0, 2) => 1,
        (0, 3) => 2,
        (1, 2) => 3,
        (1, 3) => 4,
        (2, 3) => 5,
        _ => panic!("not a tetrahedron edge"),
    }
}

/// One tetrahedron: four face gluings, cusp indices, peripheral curve
/// coordinates and edge veerings.
#[derive(Debug, Clone)]
pub struct Tetrahedron {
    label: usize,
    glued: [Option<(TetKey, Perm4)>; 4],
    cusp_indices: [i64; 4],
    meridians: [[i64; 4]; 4],
    longitudes: [[i64; 4]; 4],
    edge_labels: [Option<Veering>; 6],
}

impl Tetrahedron {
    fn new(label: usize) -> Self {
        Tetrahedron {
            label,
            glued: [None; 4],
            cusp_indices: [-1; 4],
            meridians: [[0; 4]; 4],
            longitudes: [[0; 4]; 4],
            edge_labels: [None; 6],
        }
    }

    /// The neighbour across a face, with the gluing permutation.
    pub fn glued_to(&self, side: usize) -> Option<(TetKey, Perm4)> {
        self.glued[side]
    }

    /// Cusp index at each vertex.
    pub fn cusp_indices(&self) -> &[i64; 4] {
        &self.cusp_indices
    }

    /// Meridian coordinates, one 4-vector per vertex.
    pub fn meridians(&self) -> &[[i64; 4]; 4] {
        &self.meridians
    }

    /// Longitude coordinates, one 4-vector per vertex.
    pub fn longitudes(&self) -> &[[i64; 4]; 4] {
        &self.longitudes
    }

    /// The veering of the edge joining two vertices.
    pub fn edge_label(&self, a: usize, b: usize) -> Option<Veering> {
        self.edge_labels[edge_index(a, b)]
    }
}

/// An arena of glued tetrahedra.
#[derive(Debug, Clone, Default)]
pub struct Triangulation3 {
    tets: SlotMap<TetKey, Tetrahedron>,
    order: Vec<TetKey>,
}

impl Triangulation3 {
    /// The empty triangulation.
    pub fn new() -> Self {
        Triangulation3::default()
    }

    /// Number of tetrahedra.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no tetrahedra.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tetrahedron keys in creation order.
    pub fn keys(&self) -> &[TetKey] {
        &self.order
    }

    /// Access a tetrahedron.
    pub fn tetrahedron(&self, key: TetKey) -> &Tetrahedron {
        &self.tets[key]
    }

    /// Add a fresh, unglued tetrahedron.
    pub fn create_tetrahedron(&mut self) -> TetKey {
        let label = self.order.len();
        let key = self.tets.insert(Tetrahedron::new(label));
        self.order.push(key);
        key
    }

    /// Unglue and remove a tetrahedron.
    pub fn destroy_tetrahedron(&mut self, key: TetKey) {
        for side in 0..4 {
            self.unglue(key, side);
        }
        self.tets.remove(key);
        self.order.retain(|&k| k != key);
    }

    /// Glue `side` of `key` to `target` by an odd permutation, merging
    /// edge veerings across the face. Gluing an already-glued face
    /// asserts that the existing gluing agrees.
    pub fn glue(&mut self, key: TetKey, side: usize, target: TetKey, permutation: Perm4) {
        if let Some(existing) = self.tets[key].glued[side] {
            assert_eq!(existing, (target, permutation), "face is already glued differently");
            return;
        }
        assert!(
            self.tets[target].glued[permutation.apply(side)].is_none(),
            "target face is already glued"
        );
        assert!(!permutation.is_even(), "gluing permutations must be odd");

        self.tets[key].glued[side] = Some((target, permutation));
        self.tets[target].glued[permutation.apply(side)] = Some((key, permutation.inverse()));

        // Merge the edge veerings across the glued face.
        let meeting = VERTICES_MEETING[side];
        for i in 0..3 {
            for j in i + 1..3 {
                let (a, b) = (meeting[i], meeting[j]);
                let ours = self.tets[key].edge_labels[edge_index(a, b)];
                let theirs = self.tets[target].edge_labels
                    [edge_index(permutation.apply(a), permutation.apply(b))];
                match (ours, theirs) {
                    (None, Some(v)) => {
                        self.tets[key].edge_labels[edge_index(a, b)] = Some(v);
                    }
                    (Some(v), None) => {
                        self.tets[target].edge_labels
                            [edge_index(permutation.apply(a), permutation.apply(b))] = Some(v);
                    }
                    (Some(v), Some(w)) => {
                        assert_eq!(v, w, "veering labels clash across a gluing");
                    }
                    (None, None) => {}
                }
            }
        }
    }

    /// Remove the gluing on one face (both directions).
    pub fn unglue(&mut self, key: TetKey, side: usize) {
        if let Some((target, permutation)) = self.tets[key].glued[side] {
            self.tets[target].glued[permutation.apply(side)] = None;
            self.tets[key].glued[side] = None;
        }
    }

    /// A copy whose tetrahedra come in the same order; returns the copy
    /// and the key translation.
    pub fn duplicate(&self) -> (Triangulation3, slotmap::SecondaryMap<TetKey, TetKey>) {
        let mut copy = Triangulation3::new();
        let mut forwards = slotmap::SecondaryMap::new();
        for &key in &self.order {
            forwards.insert(key, copy.create_tetrahedron());
        }
        for &key in &self.order {
            let source = &self.tets[key];
            let target_key = forwards[key];
            let target = &mut copy.tets[target_key];
            target.cusp_indices = source.cusp_indices;
            target.meridians = source.meridians;
            target.longitudes = source.longitudes;
            target.edge_labels = source.edge_labels;
        }
        for &key in &self.order {
            for side in 0..4 {
                if let Some((neighbour, permutation)) = self.tets[key].glued[side] {
                    let a = forwards[key];
                    let b = forwards[neighbour];
                    if copy.tets[a].glued[side].is_none() {
                        copy.tets[a].glued[side] = Some((b, permutation));
                    }
                }
            }
        }
        (copy, forwards)
    }

    /// Relabel tetrahedra by creation order.
    pub fn reindex(&mut self) {
        for (index, &key) in self.order.iter().enumerate() {
            self.tets[key].label = index;
        }
    }

    /// Whether every face of every tetrahedron is glued.
    pub fn is_closed(&self) -> bool {
        self.order.iter().all(|&key| self.tets[key].glued.iter().all(Option::is_some))
    }

    /// Group the tetrahedron vertices into cusp classes by walking face
    /// gluings, assign cusp indices, and return the classes sorted
    /// deterministically.
    pub fn assign_cusp_indices(&mut self) -> Vec<Vec<(TetKey, usize)>> {
        self.reindex();
        let mut remaining: Vec<(TetKey, usize)> = self
            .order
            .iter()
            .flat_map(|&key| (0..4).map(move |vertex| (key, vertex)))
            .collect();
        remaining.reverse();
        let mut seen: slotmap::SecondaryMap<TetKey, [bool; 4]> = slotmap::SecondaryMap::new();
        for &key in &self.order {
            seen.insert(key, [false; 4]);
        }

        let mut classes: Vec<Vec<(TetKey, usize)>> = Vec::new();
        while let Some((key, vertex)) = remaining.pop() {
            if seen[key][vertex] {
                continue;
            }
            let mut class = Vec::new();
            let mut queue = vec![(key, vertex)];
            seen[key][vertex] = true;
            while let Some((current, v)) = queue.pop() {
                class.push((current, v));
                for side in VERTICES_MEETING[v] {
                    if let Some((neighbour, permutation)) = self.tets[current].glued[side] {
                        let image = (neighbour, permutation.apply(v));
                        if !seen[image.0][image.1] {
                            seen[image.0][image.1] = true;
                            queue.push(image);
                        }
                    }
                }
            }
            class.sort_by_key(|&(k, v)| (self.tets[k].label, v));
            classes.push(class);
        }
        classes.sort_by_key(|class| {
            let &(k, v) = class.first().expect("classes are nonempty");
            (self.tets[k].label, v)
        });
        for (index, class) in classes.iter().enumerate() {
            for &(key, vertex) in class {
                self.tets[key].cusp_indices[vertex] = index as i64;
            }
        }
        classes
    }

    /// The closed triangulation in SnapPy's text format.
    pub fn snappy_string(&mut self) -> Result<String> {
        use std::fmt::Write as _;

        if !self.is_closed() {
            return Err(Error::assumption("layered triangulation is not closed"));
        }
        let cusps = self.assign_cusp_indices();
        let mut s = String::new();
        let _ = writeln!(s, "% Triangulation");
        let _ = writeln!(s, "Flipper_triangulation");
        let _ = writeln!(s, "not_attempted  0.0");
        let _ = writeln!(s, "oriented_manifold");
        let _ = writeln!(s, "CS_unknown");
        let _ = writeln!(s);
        let _ = writeln!(s, "{} 0", cusps.len());
        for _ in 0..cusps.len() {
            let _ = writeln!(s, "    torus   0.000000000000   0.000000000000");
        }
        let _ = writeln!(s);
        let _ = writeln!(s, "{}", self.len());
        for &key in &self.order {
            let tet = &self.tets[key];
            let neighbours: Vec<String> = (0..4)
                .map(|side| {
                    let (n, _) = tet.glued[side].expect("closed triangulation");
                    format!("{:4}", self.tets[n].label)
                })
                .collect();
            let _ = writeln!(s, "{} ", neighbours.join(" "));
            let gluings: Vec<String> = (0..4)
                .map(|side| {
                    let (_, p) = tet.glued[side].expect("closed triangulation");
                    format!("{}", p)
                })
                .collect();
            let _ = writeln!(s, " {}", gluings.join(" "));
            let cusp_line: Vec<String> =
                tet.cusp_indices.iter().map(|c| format!("{:4}", c)).collect();
            let _ = writeln!(s, "{} ", cusp_line.join(" "));
            let peripheral = |rows: &[[i64; 4]; 4]| -> String {
                let values: Vec<String> =
                    rows.iter().flatten().map(|v| format!("{:2}", v)).collect();
                format!(" {}", values.join(" "))
            };
            let zeros = [[0i64; 4]; 4];
            let _ = writeln!(s, "{}", peripheral(&tet.meridians));
            let _ = writeln!(s, "{}", peripheral(&zeros));
            let _ = writeln!(s, "{}", peripheral(&tet.longitudes));
            let _ = writeln!(s, "{}", peripheral(&zeros));
            let _ = writeln!(s, "  0.000000000000   0.000000000000");
            let _ = writeln!(s);
        }
        Ok(s)
    }
}

impl fmt::Display for Triangulation3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &key in &self.order {
            let tet = &self.tets[key];
            let gluings: Vec<String> = (0..4)
                .map(|side| match tet.glued[side] {
                    Some((n, p)) => format!("{}:{}", self.tets[n].label, p),
                    None => "-".into(),
                })
                .collect();
            writeln!(f, "tet {}: {}", tet.label, gluings.join(" "))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// The layered construction
// ---------------------------------------------------------------------------

/// Exit side when turning left around a cusp, by (current side,
/// arrival side).
fn exit_cusp_left(side: usize, arrive: usize) -> usize {
    match (side, arrive) {
        (0, 1) => 3,
        (0, 2) => 1,
        (0, 3) => 2,
        (1, 0) => 2,
        (1, 2) => 3,
        (1, 3) => 0,
        (2, 0) => 3,
        (2, 1) => 0,
        (2, 3) => 1,
        (3, 0) => 1,
        (3, 1) => 2,
        (3, 2) => 0,
        _ => panic!("invalid cusp walk state"),
    }
}

/// Exit side when turning right: the orientation-reversed companion of
/// [`exit_cusp_left`].
fn exit_cusp_right(side: usize, arrive: usize) -> usize {
    match (side, arrive) {
        (0, 1) => 2,
        (0, 2) => 3,
        (0, 3) => 1,
        (1, 0) => 3,
        (1, 2) => 0,
        (1, 3) => 2,
        (2, 0) => 1,
        (2, 1) => 3,
        (2, 3) => 0,
        (3, 0) => 2,
        (3, 1) => 0,
        (3, 2) => 1,
        _ => panic!("invalid cusp walk state"),
    }
}

/// A stack of tetrahedra layered over a surface triangulation.
///
/// The flip bookkeeping leans on the conventions of
/// [`Triangulation::flip_edge`]: the two rewritten triangles keep their
/// positions, the side carrying the positive label stays first.
pub struct LayeredTriangulation {
    lower_triangulation: Arc<Triangulation>,
    upper_triangulation: Arc<Triangulation>,
    core: Triangulation3,
    /// Per lower-triangle position: the boundary tetrahedron below it
    /// and the map from triangle corners (plus 3 for the inner face) to
    /// tetrahedron vertices.
    lower_map: Vec<(TetKey, Perm4)>,
    /// Per upper-triangle position, likewise; face 3 of the cap always
    /// points down into the core.
    upper_map: Vec<(TetKey, Perm4)>,
}

impl LayeredTriangulation {
    /// Two copies of the surface joined by a block of paired
    /// tetrahedra.
    pub fn new(triangulation: &Arc<Triangulation>) -> Self {
        let n = triangulation.num_triangles();
        let mut core = Triangulation3::new();
        let lower: Vec<TetKey> = (0..n).map(|_| core.create_tetrahedron()).collect();
        let upper: Vec<TetKey> = (0..n).map(|_| core.create_tetrahedron()).collect();
        let pairing = Perm4::new([0, 2, 1, 3]);
        for (&l, &u) in lower.iter().zip(upper.iter()) {
            core.glue(l, 3, u, pairing);
        }
        LayeredTriangulation {
            lower_triangulation: Arc::clone(triangulation),
            upper_triangulation: Arc::clone(triangulation),
            core,
            lower_map: lower.into_iter().map(|k| (k, Perm4::identity())).collect(),
            upper_map: upper.into_iter().map(|k| (k, pairing)).collect(),
        }
    }

    /// The current upper surface.
    pub fn upper_triangulation(&self) -> &Arc<Triangulation> {
        &self.upper_triangulation
    }

    /// The fixed lower surface.
    pub fn lower_triangulation(&self) -> &Arc<Triangulation> {
        &self.lower_triangulation
    }

    /// Number of tetrahedra in the stack, boundary included.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Whether the stack is empty (it never is).
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// Layer one flip of the upper triangulation: insert a tetrahedron
    /// whose 1-3 edge lies over the flipped edge, veered by the
    /// handedness of the square.
    pub fn flip(&mut self, edge: usize) {
        assert!(
            self.upper_triangulation.is_flippable(edge),
            "edge {} is not flippable in the upper triangulation",
            edge
        );
        // The square (e, x, y) / (~e, z, w): P and Q are the tail and
        // head of e, R and S the apexes of its two triangles. The new
        // tetrahedron is P=1, Q=3, R=0, S=2.
        let ((pos_a, k_a), (pos_b, k_b)) = self.upper_triangulation.find_edge(edge);
        let (cap_a, perm_a) = self.upper_map[pos_a];
        let (cap_b, perm_b) = self.upper_map[pos_b];
        let (below_a, down_a) =
            self.core.tets[cap_a].glued[3].expect("caps are glued into the core");
        let (below_b, down_b) =
            self.core.tets[cap_b].glued[3].expect("caps are glued into the core");
        self.core.unglue(cap_a, 3);
        self.core.unglue(cap_b, 3);
        // The caps are rebuilt boundary markers, not persistent
        // tetrahedra: their edges change meaning with every layer, so
        // any labels they accumulated no longer name real edges.
        self.core.tets[cap_a].edge_labels = [None; 6];
        self.core.tets[cap_b].edge_labels = [None; 6];

        let tet = self.core.create_tetrahedron();
        self.core.tets[tet].edge_labels[edge_index(0, 1)] = Some(Veering::Right);
        self.core.tets[tet].edge_labels[edge_index(2, 3)] = Some(Veering::Right);
        self.core.tets[tet].edge_labels[edge_index(1, 2)] = Some(Veering::Left);
        self.core.tets[tet].edge_labels[edge_index(0, 3)] = Some(Veering::Left);

        // Face 2 is the old (e, x, y) triangle, whose corners P, Q, R
        // sit at stored positions k_a, k_a+1, k_a+2.
        let glue_a = {
            let mut image = [0u8; 4];
            image[1] = down_a.apply(perm_a.apply(k_a)) as u8;
            image[3] = down_a.apply(perm_a.apply((k_a + 1) % 3)) as u8;
            image[0] = down_a.apply(perm_a.apply((k_a + 2) % 3)) as u8;
            image[2] = down_a.apply(3) as u8;
            Perm4::new(image)
        };
        self.core.glue(tet, 2, below_a, glue_a);
        // Face 0 is the old (~e, z, w) triangle with corners Q, P, S.
        let glue_b = {
            let mut image = [0u8; 4];
            image[3] = down_b.apply(perm_b.apply(k_b)) as u8;
            image[1] = down_b.apply(perm_b.apply((k_b + 1) % 3)) as u8;
            image[2] = down_b.apply(perm_b.apply((k_b + 2) % 3)) as u8;
            image[0] = down_b.apply(3) as u8;
            Perm4::new(image)
        };
        self.core.glue(tet, 0, below_b, glue_b);

        // The caps ride on top of the new tetrahedron.
        self.core.glue(tet, 3, cap_a, Perm4::new([2, 1, 0, 3]));
        self.core.glue(tet, 1, cap_b, Perm4::new([0, 3, 2, 1]));

        self.upper_triangulation = self.upper_triangulation.flip_edge(edge);
        let rebuilt = Perm4::new([0, 2, 1, 3]);
        self.upper_map[pos_a] = (cap_a, rebuilt);
        self.upper_map[pos_b] = (cap_b, rebuilt);
    }

    /// Layer a sequence of flips.
    pub fn flips(&mut self, sequence: &[usize]) {
        for &edge in sequence {
            self.flip(edge);
        }
    }

    /// Close the stack through an isometry from the upper to the lower
    /// triangulation, returning the closed manifold with cusps and
    /// peripheral curves installed.
    pub fn close(&self, isometry: &Isometry) -> Result<Triangulation3> {
        assert_eq!(
            **isometry.source(),
            *self.upper_triangulation,
            "closing isometry must start on the upper triangulation"
        );
        assert_eq!(
            **isometry.target(),
            *self.lower_triangulation,
            "closing isometry must land on the lower triangulation"
        );

        let (mut closed, forwards) = self.core.duplicate();

        // The fibre surface: the faces of the core below the upper caps
        // and above the lower boundary.
        let mut fibre_surface: Vec<(TetKey, usize)> = Vec::new();
        for &(cap, _) in &self.upper_map {
            let (below, down) = self.core.tets[cap].glued[3].expect("cap glued");
            fibre_surface.push((forwards[below], down.apply(3)));
        }
        for &(boundary, _) in &self.lower_map {
            let (above, up) = self.core.tets[boundary].glued[3].expect("boundary glued");
            fibre_surface.push((forwards[above], up.apply(3)));
        }

        // Remove the two boundary layers.
        for &(cap, _) in &self.upper_map {
            closed.destroy_tetrahedron(forwards[cap]);
        }
        for &(boundary, _) in &self.lower_map {
            closed.destroy_tetrahedron(forwards[boundary]);
        }

        // Glue top to bottom through the isometry.
        let triangle_map = isometry.triangle_map();
        for (pos_u, &(matching, rotation)) in triangle_map.iter().enumerate() {
            let corner_rotation = Perm4::new([
                rotation as u8,
                ((rotation + 1) % 3) as u8,
                ((rotation + 2) % 3) as u8,
                3,
            ]);
            let (cap, perm_u) = self.upper_map[pos_u];
            let (boundary, perm_l) = self.lower_map[matching];
            let (below_u, down_u) = self.core.tets[cap].glued[3].expect("cap glued");
            let (below_l, down_l) = self.core.tets[boundary].glued[3].expect("boundary glued");
            let gluing = down_l
                .compose(perm_l)
                .compose(corner_rotation)
                .compose(perm_u.inverse())
                .compose(down_u.inverse());
            closed.glue(forwards[below_u], down_u.apply(3), forwards[below_l], gluing);
        }

        let cusps = closed.assign_cusp_indices();
        debug!("closed bundle: {} tetrahedra, {} cusps", closed.len(), cusps.len());
        install_peripheral_curves(&mut closed, &cusps, &fibre_surface)?;
        Ok(closed)
    }
}

/// Install a meridian and a longitude on every cusp.
fn install_peripheral_curves(
    closed: &mut Triangulation3,
    cusps: &[Vec<(TetKey, usize)>],
    fibre_surface: &[(TetKey, usize)],
) -> Result<()> {
    let on_fibre = |key: TetKey, side: usize| fibre_surface.contains(&(key, side));
    for cusp in cusps {
        // A starting corner on the fibre surface such that the first
        // step rightwards does not cross it.
        let start = cusp
            .iter()
            .copied()
            .find(|&(key, side)| {
                (side == 0 && on_fibre(key, 2)) || (side == 2 && on_fibre(key, 0))
            })
            .ok_or_else(|| {
                Error::computation("no starting corner on the fibre surface for a cusp")
            })?;
        let (start_key, start_side) = start;

        // Every walk visits each cusp corner at most a bounded number of
        // times; exceeding the budget means a convention was violated.
        let budget = 16 * closed.len().max(1) + 16;

        // Meridian: one step to the right, then walk turning left,
        // switching the turn direction at every fibre crossing.
        let leave = if start_side == 0 { 1 } else { 3 };
        let (mut current, mut side, mut arrive) =
            step(closed, start_key, start_side, leave, true);
        let mut turn_left = true;
        let mut steps = 0;
        while (current, side) != (start_key, start_side) {
            steps += 1;
            if steps > budget {
                return Err(Error::computation("meridian walk does not close up"));
            }
            let leave = if turn_left {
                exit_cusp_left(side, arrive)
            } else {
                exit_cusp_right(side, arrive)
            };
            if on_fibre(current, leave) {
                turn_left = !turn_left;
            }
            (current, side, arrive) = step(closed, current, side, leave, true);
        }

        // Longitude: the same first step, then climb straight up (side
        // 1) until the meridian appears, then follow its exit sides
        // back to the start.
        let leave = if start_side == 0 { 1 } else { 3 };
        let (mut current, mut side, _) = step(closed, start_key, start_side, leave, false);
        let mut steps = 0;
        loop {
            steps += 1;
            if steps > budget {
                return Err(Error::computation("longitude climb does not meet the meridian"));
            }
            let (next, next_side, _) = step(closed, current, side, 1, false);
            (current, side) = (next, next_side);
            if closed.tets[current].meridians[side] != [0, 0, 0, 0] {
                break;
            }
        }
        let mut steps = 0;
        while (current, side) != (start_key, start_side) {
            steps += 1;
            if steps > budget {
                return Err(Error::computation("longitude walk does not close up"));
            }
            let leave = (0..4)
                .find(|&s| closed.tets[current].meridians[side][s] == -1)
                .ok_or_else(|| Error::computation("longitude lost the meridian"))?;
            let (next, next_side, _) = step(closed, current, side, leave, false);
            (current, side) = (next, next_side);
        }
    }
    Ok(())
}

/// Record a `-1` on the exit face and a `+1` on the arrival face of the
/// chosen peripheral curve, then cross the gluing. Returns the new
/// tetrahedron, cusp side and arrival face.
fn step(
    closed: &mut Triangulation3,
    current: TetKey,
    side: usize,
    leave: usize,
    meridian: bool,
) -> (TetKey, usize, usize) {
    if meridian {
        closed.tets[current].meridians[side][leave] = -1;
    } else {
        closed.tets[current].longitudes[side][leave] = -1;
    }
    let (next, permutation) = closed.tets[current].glued[leave].expect("closed triangulation");
    let next_side = permutation.apply(side);
    let arrive = permutation.apply(leave);
    if meridian {
        closed.tets[next].meridians[next_side][arrive] = 1;
    } else {
        closed.tets[next].longitudes[next_side][arrive] = 1;
    }
    (next, next_side, arrive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn once_punctured_torus() -> Arc<Triangulation> {
        Triangulation::from_triangles(&[[0, 1, 2], [!0, !1, !2]])
    }

    #[test]
    fn test_initial_block() {
        let t = once_punctured_torus();
        let layered = LayeredTriangulation::new(&t);
        assert_eq!(layered.len(), 4);
    }

    #[test]
    fn test_flip_adds_tetrahedron() {
        let t = once_punctured_torus();
        let mut layered = LayeredTriangulation::new(&t);
        layered.flip(1);
        assert_eq!(layered.len(), 5);
        layered.flip(0);
        assert_eq!(layered.len(), 6);
        // The upper surface followed the flips back to the start.
        assert_eq!(
            layered.upper_triangulation().triangles().to_vec(),
            vec![[0, 1, 2], [!0, !1, !2]]
        );
    }

    #[test]
    fn test_veering_labels_on_flip_tetrahedron() {
        let t = once_punctured_torus();
        let mut layered = LayeredTriangulation::new(&t);
        layered.flip(1);
        let key = *layered.core.keys().last().expect("flip tetrahedron");
        let tet = layered.core.tetrahedron(key);
        assert_eq!(tet.edge_label(0, 1), Some(Veering::Right));
        assert_eq!(tet.edge_label(2, 3), Some(Veering::Right));
        assert_eq!(tet.edge_label(1, 2), Some(Veering::Left));
        assert_eq!(tet.edge_label(0, 3), Some(Veering::Left));
        assert_eq!(tet.edge_label(1, 3), None);
    }
}
