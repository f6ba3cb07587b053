//! Point quadtree for proximity queries over placed features.
//!
//! Points are integer cell positions; bounds are float rectangles. A leaf holds points
//! until it has more than [`MAX_POINTS_PER_NODE`], then splits once into four equal
//! quadrants and hands its points down. Trees are built per placement pass and never
//! shrink.

use serde::{Deserialize, Serialize};

/// Occupancy above which a leaf splits
pub const MAX_POINTS_PER_NODE: usize = 10;
/// Nodes at this depth never split, so stacked identical points stay bounded
pub const MAX_DEPTH: u32 = 8;

/// Integer cell position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle from `(x, y)` spanning `width × height`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Square window covering every cell within `radius` of `center` on both axes.
    pub fn around(center: Point, radius: i32) -> Self {
        let side = (2 * radius + 1) as f32;
        Self::new((center.x - radius) as f32, (center.y - radius) as f32, side, side)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment: `min <= p < max` on both axes.
    pub fn contains(&self, p: Point) -> bool {
        let (px, py) = (p.x as f32, p.y as f32);
        px >= self.x && px < self.max_x() && py >= self.y && py < self.max_y()
    }

    /// Closed overlap test; rectangles sharing only an edge intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.max_x() >= other.x
            && self.x <= other.max_x()
            && self.max_y() >= other.y
            && self.y <= other.max_y()
    }
}

/// Node extent as explicit edges. Children share the parent's centre line, so the
/// quadrants tile the parent's half-open extent exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Edges {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Edges {
    fn from_rect(r: &Rect) -> Self {
        Self {
            min_x: r.x,
            min_y: r.y,
            max_x: r.max_x(),
            max_y: r.max_y(),
        }
    }

    fn to_rect(self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x - self.min_x, self.max_y - self.min_y)
    }

    fn center(&self) -> (f32, f32) {
        (
            self.min_x + (self.max_x - self.min_x) / 2.0,
            self.min_y + (self.max_y - self.min_y) / 2.0,
        )
    }

    fn contains(&self, p: Point) -> bool {
        let (px, py) = (p.x as f32, p.y as f32);
        px >= self.min_x && px < self.max_x && py >= self.min_y && py < self.max_y
    }

    fn intersects(&self, r: &Rect) -> bool {
        self.max_x >= r.x && self.min_x <= r.max_x() && self.max_y >= r.y && self.min_y <= r.max_y()
    }

    /// Ordered to match [`QuadtreeNode::child_index`].
    fn quadrants(&self) -> [Edges; 4] {
        let (cx, cy) = self.center();
        let e = |min_x, min_y, max_x, max_y| Edges { min_x, min_y, max_x, max_y };
        [
            e(self.min_x, self.min_y, cx, cy),
            e(cx, self.min_y, self.max_x, cy),
            e(self.min_x, cy, cx, self.max_y),
            e(cx, cy, self.max_x, self.max_y),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct QuadtreeNode {
    edges: Edges,
    depth: u32,
    points: Vec<Point>,
    children: Option<Box<[QuadtreeNode; 4]>>,
}

impl QuadtreeNode {
    fn new(edges: Edges, depth: u32) -> Self {
        Self {
            edges,
            depth,
            points: Vec::new(),
            children: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.edges.to_rect()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Quadrant index: +1 right of centre, +2 below centre.
    fn child_index(&self, p: Point) -> usize {
        let (cx, cy) = self.edges.center();
        let mut index = 0;
        if p.x as f32 >= cx {
            index += 1;
        }
        if p.y as f32 >= cy {
            index += 2;
        }
        index
    }

    /// Store `p`, which the caller has already checked lies inside this node.
    fn insert(&mut self, p: Point) {
        debug_assert!(self.edges.contains(p));
        let index = self.child_index(p);
        if let Some(children) = self.children.as_mut() {
            children[index].insert(p);
            return;
        }

        self.points.push(p);
        if self.points.len() > MAX_POINTS_PER_NODE && self.depth < MAX_DEPTH {
            self.subdivide();
        }
    }

    fn subdivide(&mut self) {
        let depth = self.depth + 1;
        let mut children = Box::new(self.edges.quadrants().map(|e| QuadtreeNode::new(e, depth)));
        for p in std::mem::take(&mut self.points) {
            let index = self.child_index(p);
            children[index].insert(p);
        }
        self.children = Some(children);
    }

    fn query(&self, range: &Rect, found: &mut Vec<Point>) {
        if !self.edges.intersects(range) {
            return;
        }
        found.extend(self.points.iter().copied().filter(|p| range.contains(*p)));
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, found);
            }
        }
    }

    fn count_nodes(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(QuadtreeNode::count_nodes).sum::<usize>())
    }
}

/// Quadtree rooted at a fixed bound
#[derive(Clone, Debug)]
pub struct Quadtree {
    bounds: Rect,
    root: QuadtreeNode,
    len: usize,
}

impl Quadtree {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            root: QuadtreeNode::new(Edges::from_rect(&bounds), 0),
            len: 0,
        }
    }

    /// Insert a point. Returns `false`, leaving the tree untouched, when the point lies
    /// outside the root bound.
    pub fn insert(&mut self, p: Point) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        self.root.insert(p);
        self.len += 1;
        true
    }

    /// Every stored point inside `range`, in no particular order.
    pub fn query_range(&self, range: &Rect) -> Vec<Point> {
        let mut found = Vec::new();
        self.root.query(range, &mut found);
        found
    }

    /// True if any stored point lies within `radius` cells of `center` on both axes.
    pub fn any_within(&self, center: Point, radius: i32) -> bool {
        !self.query_range(&Rect::around(center, radius)).is_empty()
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn root(&self) -> &QuadtreeNode {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }
}
