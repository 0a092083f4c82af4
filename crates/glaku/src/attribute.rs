//! Vertex attribute semantics and the per-context layout registry.

use std::collections::HashMap;

/// Semantic type of a vertex attribute as declared by a program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl AttributeType {
    pub fn stride(self) -> Stride {
        match self {
            AttributeType::Float => Stride::Scalar(1),
            AttributeType::Vec2 => Stride::Scalar(2),
            AttributeType::Vec3 => Stride::Scalar(3),
            AttributeType::Vec4 => Stride::Scalar(4),
            AttributeType::Mat3 => Stride::Matrix { rows: 3, cols: 3 },
            AttributeType::Mat4 => Stride::Matrix { rows: 4, cols: 4 },
        }
    }

    pub fn glsl_name(self) -> &'static str {
        match self {
            AttributeType::Float => "float",
            AttributeType::Vec2 => "vec2",
            AttributeType::Vec3 => "vec3",
            AttributeType::Vec4 => "vec4",
            AttributeType::Mat3 => "mat3",
            AttributeType::Mat4 => "mat4",
        }
    }
}

/// Per-vertex (or per-instance) footprint of an attribute.
///
/// Matrices occupy `rows` consecutive attribute slots of `cols` floats each.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Stride {
    Scalar(u32),
    Matrix { rows: u32, cols: u32 },
}

/// One attribute pointer: which slot, how many floats, and where in the element.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SlotLayout {
    pub index: u32,
    pub size: i32,
    pub stride_bytes: i32,
    pub offset_bytes: i32,
}

impl Stride {
    /// Floats per element.
    #[inline]
    pub fn components(self) -> u32 {
        match self {
            Stride::Scalar(n) => n,
            Stride::Matrix { rows, cols } => rows * cols,
        }
    }

    /// Attribute slots consumed starting at the base location.
    #[inline]
    pub fn slots(self) -> u32 {
        match self {
            Stride::Scalar(_) => 1,
            Stride::Matrix { rows, .. } => rows,
        }
    }

    /// Pointer descriptions for every slot, starting at `location`.
    ///
    /// Scalars are tightly packed (stride 0); matrix slot `i` sits at
    /// `i * cols * 4` bytes inside a `rows * cols * 4` byte element.
    pub fn slot_layouts(self, location: u32) -> impl Iterator<Item = SlotLayout> {
        let (rows, cols, stride_bytes) = match self {
            Stride::Scalar(n) => (1, n, 0),
            Stride::Matrix { rows, cols } => (rows, cols, (rows * cols * 4) as i32),
        };
        (0..rows).map(move |i| SlotLayout {
            index: location + i,
            size: cols as i32,
            stride_bytes,
            offset_bytes: (i * cols * 4) as i32,
        })
    }
}

/// Resolved location + stride of one attribute name.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeLayout {
    pub location: u32,
    pub stride: Stride,
}

/// Attribute layouts shared by every program of one context.
///
/// A name is resolved at most once: the first program declaring an active
/// attribute of that name fixes its location and stride, and later programs
/// reusing the name are assumed to agree.
#[derive(Debug, Default)]
pub struct AttributeLayouts {
    layouts: HashMap<String, AttributeLayout>,
}

impl AttributeLayouts {
    #[inline]
    pub fn get(&self, name: &str) -> Option<AttributeLayout> {
        self.layouts.get(name).copied()
    }

    #[inline]
    pub fn is_resolved(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Records `layout` unless `name` is already resolved. Returns whether it was recorded.
    pub fn insert_first(&mut self, name: &str, layout: AttributeLayout) -> bool {
        if self.layouts.contains_key(name) {
            return false;
        }
        self.layouts.insert(name.to_string(), layout);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat4_spans_four_slots_of_vec4() {
        let slots: Vec<_> = AttributeType::Mat4.stride().slot_layouts(3).collect();
        assert_eq!(slots.len(), 4);
        for (i, s) in slots.iter().enumerate() {
            assert_eq!(s.index, 3 + i as u32);
            assert_eq!(s.size, 4);
            assert_eq!(s.stride_bytes, 64);
            assert_eq!(s.offset_bytes, i as i32 * 16);
        }
    }

    #[test]
    fn mat3_offsets_follow_columns() {
        let offsets: Vec<_> = AttributeType::Mat3
            .stride()
            .slot_layouts(0)
            .map(|s| (s.offset_bytes, s.stride_bytes))
            .collect();
        assert_eq!(offsets, vec![(0, 36), (12, 36), (24, 36)]);
    }

    #[test]
    fn scalar_is_single_packed_slot() {
        let slots: Vec<_> = Stride::Scalar(3).slot_layouts(7).collect();
        assert_eq!(
            slots,
            vec![SlotLayout { index: 7, size: 3, stride_bytes: 0, offset_bytes: 0 }]
        );
    }

    #[test]
    fn components_count_matrix_cells() {
        assert_eq!(AttributeType::Vec2.stride().components(), 2);
        assert_eq!(AttributeType::Mat3.stride().components(), 9);
        assert_eq!(AttributeType::Mat4.stride().components(), 16);
    }

    #[test]
    fn first_layout_wins() {
        let mut layouts = AttributeLayouts::default();
        let first = AttributeLayout { location: 1, stride: Stride::Scalar(3) };
        let second = AttributeLayout { location: 5, stride: Stride::Scalar(4) };
        assert!(layouts.insert_first("a_position", first));
        assert!(!layouts.insert_first("a_position", second));
        assert_eq!(layouts.get("a_position"), Some(first));
    }
}
