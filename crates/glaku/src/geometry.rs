//! Geometry registry: vertex arrays, static attribute buffers, index buffers
//! and per-instance attribute buffers.

use std::collections::HashMap;

use crate::attribute::AttributeLayout;
use crate::context::Context;
use crate::error::{allocated, Error, ResourceKind, Result};
use crate::gl::{BufferTarget, BufferUsage, GlBackend};

pub(crate) struct InstancedBuffer<B> {
    pub buffer: B,
    pub capacity_bytes: usize,
}

pub(crate) struct GeometryEntry<G: GlBackend> {
    pub vertex_array: G::VertexArray,
    pub index_buffer: Option<G::Buffer>,
    pub instanced: HashMap<String, InstancedBuffer<G::Buffer>>,
    /// Index count when indexed, otherwise vertex count.
    pub count: u32,
}

impl<G: GlBackend> GeometryEntry<G> {
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }
}

/// Declarative description of a geometry.
#[derive(Debug, Clone, Default)]
pub struct GeometryDesc {
    pub id: String,
    /// Attribute arrays in declaration order; the first non-instanced one
    /// decides the vertex count of non-indexed geometry.
    pub attributes: Vec<(String, Vec<f32>)>,
    pub index: Option<Vec<u16>>,
    /// Attribute names fed per instance instead of per vertex.
    pub instanced: Vec<String>,
    /// Instance count the instanced buffers are pre-sized for.
    pub max_instances: usize,
}

impl GeometryDesc {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn attribute(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.attributes.push((name.into(), values));
        self
    }

    pub fn index(mut self, index: Vec<u16>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn instanced(mut self, name: impl Into<String>) -> Self {
        self.instanced.push(name.into());
        self
    }

    pub fn max_instances(mut self, n: usize) -> Self {
        self.max_instances = n;
        self
    }
}

impl<G: GlBackend> Context<G> {
    /// Builds a vertex array from static attribute arrays and an optional
    /// 16-bit index buffer, and registers it under `id`.
    ///
    /// Every attribute must already have a resolved layout, i.e. some
    /// program declaring it was created first.
    pub fn create_geometry(
        &mut self,
        id: &str,
        attributes: &[(&str, &[f32])],
        index: Option<&[u16]>,
    ) -> Result<()> {
        let layouts = attributes
            .iter()
            .map(|(name, _)| self.require_layout(id, name))
            .collect::<Result<Vec<_>>>()?;

        let vertex_array = allocated(ResourceKind::VertexArray, self.gl.create_vertex_array())?;
        self.gl.bind_vertex_array(Some(&vertex_array));
        // The driver binding moved; whatever was current is no longer bound.
        self.bound.geometry.invalidate();

        let mut created = Vec::with_capacity(attributes.len() + 1);
        let built = self.upload_static(attributes, &layouts, index, &mut created);
        self.gl.bind_vertex_array(None);
        let index_buffer = match built {
            Ok(index_buffer) => index_buffer,
            Err(e) => {
                for buffer in created {
                    self.gl.delete_buffer(buffer);
                }
                self.gl.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };

        let count = match index {
            Some(index) => index.len() as u32,
            None => match (attributes.first(), layouts.first()) {
                (Some((_, values)), Some(layout)) => {
                    values.len() as u32 / layout.stride.components().max(1)
                }
                _ => 0,
            },
        };

        if self.geometries.contains_key(id) {
            log::debug!("geometry `{id}` redefined");
        }
        self.geometries.insert(
            id.to_string(),
            GeometryEntry {
                vertex_array,
                index_buffer,
                instanced: HashMap::new(),
                count,
            },
        );
        log::debug!("geometry `{id}` built ({count} elements)");
        Ok(())
    }

    /// Builds geometry from `desc`, pre-sizing one instanced buffer per
    /// instanced attribute for `desc.max_instances` instances.
    ///
    /// Values given for an instanced attribute fill the front of its buffer;
    /// the rest up to `max_instances` is zeroed.
    pub fn create_geometry_from_desc(&mut self, desc: &GeometryDesc) -> Result<()> {
        let is_instanced = |name: &str| desc.instanced.iter().any(|n| n == name);

        let statics: Vec<(&str, &[f32])> = desc
            .attributes
            .iter()
            .filter(|(name, _)| !is_instanced(name))
            .map(|(name, values)| (name.as_str(), values.as_slice()))
            .collect();
        self.create_geometry(&desc.id, &statics, desc.index.as_deref())?;

        for name in &desc.instanced {
            let layout = self.require_layout(&desc.id, name)?;
            let presized = desc.max_instances * layout.stride.components() as usize;
            let mut values = desc
                .attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, values)| values.clone())
                .unwrap_or_default();
            if values.len() < presized {
                values.resize(presized, 0.0);
            }
            self.add_instanced_attribute(&desc.id, name, &values)?;
        }
        Ok(())
    }

    /// Adds a dynamic per-instance buffer for `attribute` to geometry `id`
    /// with a divisor of 1 on every slot the attribute spans.
    ///
    /// Returns the driver buffer; the context keeps its own reference for
    /// [`update_instanced_attribute`](Self::update_instanced_attribute).
    pub fn add_instanced_attribute(&mut self, id: &str, attribute: &str, values: &[f32]) -> Result<G::Buffer> {
        let layout = self.require_layout(id, attribute)?;
        if !self.geometries.contains_key(id) {
            return Err(Error::UnknownGeometry(id.to_string()));
        }
        self.use_geometry(id);

        let buffer = allocated(ResourceKind::Buffer, self.gl.create_buffer())?;
        self.gl.bind_buffer(BufferTarget::Array, Some(&buffer));
        self.gl.buffer_data(BufferTarget::Array, bytemuck::cast_slice(values), BufferUsage::DynamicDraw);
        self.enable_layout(layout);
        for slot in layout.stride.slot_layouts(layout.location) {
            self.gl.vertex_attrib_divisor(slot.index, 1);
        }
        self.gl.bind_buffer(BufferTarget::Array, None);

        if let Some(geometry) = self.geometries.get_mut(id) {
            geometry.instanced.insert(
                attribute.to_string(),
                InstancedBuffer {
                    buffer: buffer.clone(),
                    capacity_bytes: std::mem::size_of_val(values),
                },
            );
        }
        Ok(buffer)
    }

    /// Re-uploads the full contents of an instanced buffer and re-applies
    /// its attribute pointers.
    ///
    /// Data larger than the buffer's current storage re-specifies (grows)
    /// the storage instead of sub-uploading.
    pub fn update_instanced_attribute(&mut self, id: &str, attribute: &str, values: &[f32]) -> Result<()> {
        let layout = self.require_layout(id, attribute)?;
        let (buffer, capacity) = {
            let geometry = self
                .geometries
                .get(id)
                .ok_or_else(|| Error::UnknownGeometry(id.to_string()))?;
            let instanced = geometry.instanced.get(attribute).ok_or_else(|| {
                Error::UnknownInstancedAttribute {
                    geometry: id.to_string(),
                    attribute: attribute.to_string(),
                }
            })?;
            (instanced.buffer.clone(), instanced.capacity_bytes)
        };

        self.use_geometry(id);
        self.gl.bind_buffer(BufferTarget::Array, Some(&buffer));

        let bytes: &[u8] = bytemuck::cast_slice(values);
        if bytes.len() > capacity {
            self.gl.buffer_data(BufferTarget::Array, bytes, BufferUsage::DynamicDraw);
            if let Some(instanced) = self
                .geometries
                .get_mut(id)
                .and_then(|g| g.instanced.get_mut(attribute))
            {
                instanced.capacity_bytes = bytes.len();
            }
        } else {
            self.gl.buffer_sub_data(BufferTarget::Array, 0, bytes);
        }

        self.enable_layout(layout);
        self.gl.bind_buffer(BufferTarget::Array, None);
        Ok(())
    }

    /// Binds geometry `id` unless it is already the current geometry.
    pub fn use_geometry(&mut self, id: &str) {
        if self.bound.geometry.get() == Some(id) {
            return;
        }
        let Some(geometry) = self.geometries.get(id) else {
            log::error!("use_geometry: no geometry registered under `{id}`");
            return;
        };
        self.gl.bind_vertex_array(Some(&geometry.vertex_array));
        self.bound.geometry.transition(id);
    }

    /// Index count of indexed geometry, vertex count otherwise.
    pub fn draw_count(&self, id: &str) -> Option<u32> {
        self.geometries.get(id).map(|g| g.count)
    }

    /// Number of instances the instanced buffer of `attribute` can currently hold.
    pub fn instance_capacity(&self, id: &str, attribute: &str) -> Option<usize> {
        let instanced = self.geometries.get(id)?.instanced.get(attribute)?;
        let layout = self.attributes.get(attribute)?;
        let element = layout.stride.components() as usize * std::mem::size_of::<f32>();
        Some(instanced.capacity_bytes / element.max(1))
    }

    #[inline]
    pub fn has_geometry(&self, id: &str) -> bool {
        self.geometries.contains_key(id)
    }

    fn require_layout(&self, geometry: &str, attribute: &str) -> Result<AttributeLayout> {
        self.attributes
            .get(attribute)
            .ok_or_else(|| Error::UnresolvedAttribute {
                geometry: geometry.to_string(),
                attribute: attribute.to_string(),
            })
    }

    /// Enables and describes every slot of `layout` against the bound array buffer.
    fn enable_layout(&mut self, layout: AttributeLayout) {
        for slot in layout.stride.slot_layouts(layout.location) {
            self.gl.enable_vertex_attrib_array(slot.index);
            self.gl
                .vertex_attrib_pointer_f32(slot.index, slot.size, slot.stride_bytes, slot.offset_bytes);
        }
    }

    /// Uploads static buffers into the currently bound vertex array.
    ///
    /// Every buffer allocated is pushed onto `created`, so the caller can
    /// release them if a later allocation fails.
    fn upload_static(
        &mut self,
        attributes: &[(&str, &[f32])],
        layouts: &[AttributeLayout],
        index: Option<&[u16]>,
        created: &mut Vec<G::Buffer>,
    ) -> Result<Option<G::Buffer>> {
        for ((_, values), layout) in attributes.iter().zip(layouts) {
            let buffer = allocated(ResourceKind::Buffer, self.gl.create_buffer())?;
            created.push(buffer.clone());
            self.gl.bind_buffer(BufferTarget::Array, Some(&buffer));
            self.gl.buffer_data(BufferTarget::Array, bytemuck::cast_slice(values), BufferUsage::StaticDraw);
            self.enable_layout(*layout);
        }

        let index_buffer = match index {
            Some(index) => {
                let buffer = allocated(ResourceKind::Buffer, self.gl.create_buffer())?;
                created.push(buffer.clone());
                self.gl.bind_buffer(BufferTarget::ElementArray, Some(&buffer));
                self.gl.buffer_data(
                    BufferTarget::ElementArray,
                    bytemuck::cast_slice(index),
                    BufferUsage::StaticDraw,
                );
                Some(buffer)
            }
            None => None,
        };

        Ok(index_buffer)
    }
}
