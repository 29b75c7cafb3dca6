use crate::comm::GravityRequest;
use crate::particles::Particle;
use crate::potential::{softened_potential, ExportFlags, PotentialTree};
use crate::utils::HighPrecision;

/// Depth at which leaves stop splitting and hold several bodies.
const MAX_DEPTH: usize = 48;

/// Represents a cubic region in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Octant<T> {
    pub center: [T; 3],
    pub half_size: T,
}

impl<T: HighPrecision> Octant<T> {
    /// Returns true if the point is inside this octant (upper faces excluded).
    pub fn contains(&self, point: &[T; 3]) -> bool {
        (0..3).all(|k| {
            point[k] >= self.center[k] - self.half_size && point[k] < self.center[k] + self.half_size
        })
    }

    /// Index of the child octant holding `point`; bit k set means the upper half along axis k.
    pub fn child_index(&self, point: &[T; 3]) -> usize {
        (0..3).fold(0, |idx, k| if point[k] >= self.center[k] { idx | (1 << k) } else { idx })
    }

    /// Subdivides the octant into eight children ordered by [`Octant::child_index`].
    pub fn subdivide(&self) -> [Octant<T>; 8] {
        let hs = self.half_size / T::from_approx(2.0);
        std::array::from_fn(|idx| {
            let mut center = self.center;
            for (k, c) in center.iter_mut().enumerate() {
                if idx & (1 << k) != 0 {
                    *c += hs;
                } else {
                    *c -= hs;
                }
            }
            Octant { center, half_size: hs }
        })
    }

    /// Smallest cube (slightly padded) enclosing all points.
    pub fn bounding<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a [T; 3]>,
    {
        let mut lo: Option<[T; 3]> = None;
        let mut hi = [T::zero(); 3];
        for p in points {
            match lo.as_mut() {
                None => {
                    lo = Some(*p);
                    hi = *p;
                }
                Some(lo) => {
                    for k in 0..3 {
                        lo[k] = lo[k].min(p[k]);
                        hi[k] = hi[k].max(p[k]);
                    }
                }
            }
        }
        let lo = lo.unwrap_or([T::zero(); 3]);
        let half = T::from_approx(0.5);
        let center = [(lo[0] + hi[0]) * half, (lo[1] + hi[1]) * half, (lo[2] + hi[2]) * half];
        let extent = (hi[0] - lo[0]).max(hi[1] - lo[1]).max(hi[2] - lo[2]);
        let mut half_size = extent * half * T::from_approx(1.01);
        if !(half_size > T::zero()) {
            half_size = T::one();
        }
        Octant { center, half_size }
    }
}

/// Point mass stored in a leaf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body<T> {
    pub position: [T; 3],
    pub mass: T,
}

/// Octree node for potential evaluation.
#[derive(Debug, Clone)]
pub enum OctreeNode<T> {
    /// The node is empty; it stores the octant representing its region.
    Empty(Octant<T>),

    /// The node is a leaf; more than one body only below `MAX_DEPTH`.
    Leaf(Octant<T>, Vec<Body<T>>),

    /// The node is internal and carries the monopole of its subtree.
    Internal {
        octant: Octant<T>,
        mass: T,
        com: [T; 3],
        children: Box<[OctreeNode<T>; 8]>,
    },
}

impl<T: HighPrecision> OctreeNode<T> {
    pub fn new(octant: Octant<T>) -> Self {
        OctreeNode::Empty(octant)
    }

    pub fn octant(&self) -> Octant<T> {
        match self {
            OctreeNode::Empty(o) => *o,
            OctreeNode::Leaf(o, _) => *o,
            OctreeNode::Internal { octant, .. } => *octant,
        }
    }

    pub fn mass(&self) -> T {
        match self {
            OctreeNode::Empty(_) => T::zero(),
            OctreeNode::Leaf(_, bodies) => bodies.iter().fold(T::zero(), |acc, b| acc + b.mass),
            OctreeNode::Internal { mass, .. } => *mass,
        }
    }

    pub fn count_bodies(&self) -> usize {
        match self {
            OctreeNode::Empty(_) => 0,
            OctreeNode::Leaf(_, bodies) => bodies.len(),
            OctreeNode::Internal { children, .. } => children.iter().map(|c| c.count_bodies()).sum(),
        }
    }

    pub fn insert(&mut self, body: Body<T>) {
        self.insert_at_depth(body, 0);
    }

    fn insert_at_depth(&mut self, body: Body<T>, depth: usize) {
        match self {
            OctreeNode::Empty(octant) => {
                *self = OctreeNode::Leaf(*octant, vec![body]);
            }
            OctreeNode::Leaf(octant, bodies) => {
                if depth >= MAX_DEPTH {
                    bodies.push(body);
                    return;
                }
                // Split the leaf and reinsert everything it held.
                let octant = *octant;
                let existing = std::mem::take(bodies);
                *self = OctreeNode::Internal {
                    octant,
                    mass: T::zero(),
                    com: [T::zero(); 3],
                    children: Box::new(octant.subdivide().map(OctreeNode::Empty)),
                };
                for b in existing {
                    self.insert_at_depth(b, depth);
                }
                self.insert_at_depth(body, depth);
            }
            OctreeNode::Internal { octant, mass, com, children } => {
                let total = *mass + body.mass;
                for k in 0..3 {
                    com[k] = (com[k] * *mass + body.position[k] * body.mass) / total;
                }
                *mass = total;

                let idx = octant.child_index(&body.position);
                children[idx].insert_at_depth(body, depth + 1);
            }
        }
    }
}

/// Rule deciding whether a node may be replaced by its monopole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpeningCriterion<T> {
    /// Accept when `size / distance < theta`; `theta = 0` always opens.
    Geometric { theta: T },
    /// Accept when `mass · size² ≤ r⁴ · tolerance · old_acc`; particles
    /// without a previous acceleration fall back to the geometric test.
    Relative { tolerance: T, theta: T },
}

impl<T: HighPrecision> OpeningCriterion<T> {
    /// `size` is the full side length of the node, `r2` the squared distance to its mass centre.
    pub fn accepts(&self, mass: T, size: T, r2: T, old_acc: T) -> bool {
        let geometric = |theta: T| size * size < r2 * theta * theta;
        match *self {
            OpeningCriterion::Geometric { theta } => geometric(theta),
            OpeningCriterion::Relative { tolerance, theta } => {
                if old_acc > T::zero() {
                    mass * size * size <= r2 * r2 * tolerance * old_acc
                } else {
                    geometric(theta)
                }
            }
        }
    }
}

/// Summary of another task's particles, used as a pseudo-particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteDomain<T> {
    pub rank: usize,
    pub octant: Octant<T>,
    pub mass: T,
    pub com: [T; 3],
}

impl<T: HighPrecision> RemoteDomain<T> {
    /// Bounding cube, total mass and mass centre of `particles`; `None` if empty.
    pub fn summarize(rank: usize, particles: &[Particle<T>]) -> Option<Self> {
        if particles.is_empty() {
            return None;
        }
        let octant = Octant::bounding(particles.iter().map(|p| &p.position));
        let mut mass = T::zero();
        let mut weighted = [T::zero(); 3];
        for p in particles {
            mass += p.mass;
            for k in 0..3 {
                weighted[k] += p.position[k] * p.mass;
            }
        }
        let com = [weighted[0] / mass, weighted[1] / mass, weighted[2] / mass];
        Some(Self { rank, octant, mass, com })
    }
}

/// Barnes–Hut octree over one task's particles.
#[derive(Debug, Clone)]
pub struct BarnesHutTree<T> {
    root: OctreeNode<T>,
    rank: usize,
    criterion: OpeningCriterion<T>,
    domains: Vec<RemoteDomain<T>>,
}

impl<T: HighPrecision> BarnesHutTree<T> {
    /// Builds the tree of the particles owned by task `rank`.
    pub fn build(particles: &[Particle<T>], rank: usize, criterion: OpeningCriterion<T>) -> Self {
        let bounds = Octant::bounding(particles.iter().map(|p| &p.position));
        let mut root = OctreeNode::new(bounds);
        for p in particles {
            root.insert(Body { position: p.position, mass: p.mass });
        }
        Self { root, rank, criterion, domains: Vec::new() }
    }

    /// Attaches summaries of the other tasks' domains; the own rank is skipped.
    pub fn with_domains(mut self, domains: Vec<RemoteDomain<T>>) -> Self {
        let rank = self.rank;
        self.domains = domains.into_iter().filter(|d| d.rank != rank).collect();
        self
    }

    pub fn root(&self) -> &OctreeNode<T> {
        &self.root
    }

    pub fn domains(&self) -> &[RemoteDomain<T>] {
        &self.domains
    }

    /// Potential at `position` from the local particles only.
    pub fn walk(&self, position: &[T; 3], softening: T, old_acc: T) -> T {
        let mut potential = T::zero();
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            match node {
                OctreeNode::Empty(_) => {}
                OctreeNode::Leaf(_, bodies) => {
                    for b in bodies {
                        potential += softened_potential(b.mass, distance(&b.position, position), softening);
                    }
                }
                OctreeNode::Internal { octant, mass, com, children } => {
                    let r2 = distance_squared(com, position);
                    let size = octant.half_size * T::from_approx(2.0);
                    if !octant.contains(position) && self.criterion.accepts(*mass, size, r2, old_acc) {
                        potential += softened_potential(*mass, r2.sqrt(), softening);
                    } else {
                        for child in children.iter() {
                            if !matches!(child, OctreeNode::Empty(_)) {
                                stack.push(child);
                            }
                        }
                    }
                }
            }
        }
        potential
    }
}

impl<T: HighPrecision> PotentialTree<T> for BarnesHutTree<T> {
    fn evaluate_local(&self, particle: &Particle<T>, softening: T, exports: &mut ExportFlags) -> T {
        let mut potential = self.walk(&particle.position, softening, particle.old_acc);

        for domain in &self.domains {
            let r2 = distance_squared(&domain.com, &particle.position);
            let size = domain.octant.half_size * T::from_approx(2.0);
            if !domain.octant.contains(&particle.position)
                && self.criterion.accepts(domain.mass, size, r2, particle.old_acc)
            {
                potential += softened_potential(domain.mass, r2.sqrt(), softening);
            } else {
                exports.set(domain.rank);
            }
        }
        potential
    }

    fn evaluate_remote(&self, request: &GravityRequest<T>, softening: T) -> T {
        self.walk(&request.position, softening, request.old_acc)
    }
}

fn distance_squared<T: HighPrecision>(a: &[T; 3], b: &[T; 3]) -> T {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

fn distance<T: HighPrecision>(a: &[T; 3], b: &[T; 3]) -> T {
    distance_squared(a, b).sqrt()
}
