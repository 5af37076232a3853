use std::collections::HashMap;

use super::object::SceneObject;
use crate::renderer::{
    primitives, IndexBuffer, Material, RenderError, RenderResult, VertexAttribute, VertexBuffer,
    VertexLayout,
};

/// Interleaved layout of imported models.
pub fn obj_layout() -> VertexLayout {
    VertexLayout::new(vec![
        VertexAttribute::float("position", 3),
        VertexAttribute::float("texCoord", 2),
        VertexAttribute::float("normal", 3),
    ])
}

/// Fan triangulation around the first vertex: `(v0, v[i-1], v[i])`.
///
/// Only correct for convex polygons.
pub fn triangulate<T: Copy>(face: &[T]) -> Vec<[T; 3]> {
    if face.len() < 3 {
        return Vec::new();
    }
    (2..face.len())
        .map(|i| [face[0], face[i - 1], face[i]])
        .collect()
}

/// Deduplicated, interleaved geometry produced from OBJ text.
#[derive(Debug, Clone)]
pub struct ObjGeometry {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub layout: VertexLayout,
}

impl ObjGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.floats_per_vertex()
    }
}

/// Zero-based indices of one face corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    tex_coord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    corners: HashMap<Corner, u32>,
    vertices: Vec<f32>,
    indices: Vec<u32>,
}

fn parse_err(line: usize, message: impl Into<String>) -> RenderError {
    RenderError::ObjParse {
        line,
        message: message.into(),
    }
}

/// Up to `N` floats, of which the first `required` must be present. Missing
/// optional components are zero.
fn parse_floats<const N: usize>(
    line: usize,
    tokens: &[&str],
    required: usize,
) -> RenderResult<[f32; N]> {
    if tokens.len() < required {
        return Err(parse_err(
            line,
            format!("expected {} components, found {}", required, tokens.len()),
        ));
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token
            .parse()
            .map_err(|_| parse_err(line, format!("invalid number '{}'", token)))?;
    }
    Ok(out)
}

/// Resolves a one-based (or negative, relative) OBJ index into `len` items.
fn resolve_index(line: usize, token: &str, len: usize, what: &str) -> RenderResult<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| parse_err(line, format!("invalid {} index '{}'", what, token)))?;
    let resolved = match raw {
        0 => None,
        n if n > 0 => Some(n - 1),
        n => Some(len as i64 + n),
    };
    match resolved {
        Some(index) if index >= 0 && (index as usize) < len => Ok(index as usize),
        _ => Err(parse_err(
            line,
            format!("{} index {} out of range ({} defined)", what, raw, len),
        )),
    }
}

impl ObjParser {
    fn parse(mut self, text: &str) -> RenderResult<ObjGeometry> {
        for (number, line) in text.lines().enumerate() {
            self.parse_line(number + 1, line.trim())?;
        }

        Ok(ObjGeometry {
            vertices: self.vertices,
            indices: self.indices,
            layout: obj_layout(),
        })
    }

    fn parse_line(&mut self, line: usize, text: &str) -> RenderResult<()> {
        let mut tokens = text.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(());
        };
        let rest: Vec<&str> = tokens.collect();

        match keyword {
            "v" => self.positions.push(parse_floats::<3>(line, &rest, 3)?),
            "vt" => {
                let [u, v] = parse_floats::<2>(line, &rest, 1)?;
                self.tex_coords.push([u, 1.0 - v]);
            }
            "vn" => self.normals.push(parse_floats::<3>(line, &rest, 3)?),
            "f" => self.add_face(line, &rest)?,
            // Comments, parameter-space vertices, polylines, materials,
            // object/group names and smoothing groups carry no geometry.
            _ => {}
        }
        Ok(())
    }

    fn parse_corner(&self, line: usize, token: &str) -> RenderResult<Corner> {
        let mut parts = token.split('/');
        let position = match parts.next() {
            Some(p) if !p.is_empty() => resolve_index(line, p, self.positions.len(), "position")?,
            _ => return Err(parse_err(line, format!("face corner '{}' has no position", token))),
        };
        let tex_coord = match parts.next() {
            Some(t) if !t.is_empty() => {
                Some(resolve_index(line, t, self.tex_coords.len(), "texture coordinate")?)
            }
            _ => None,
        };
        let normal = match parts.next() {
            Some(n) if !n.is_empty() => Some(resolve_index(line, n, self.normals.len(), "normal")?),
            _ => None,
        };

        Ok(Corner {
            position,
            tex_coord,
            normal,
        })
    }

    fn add_face(&mut self, line: usize, tokens: &[&str]) -> RenderResult<()> {
        if tokens.len() < 3 {
            log::error!("OBJ line {}: face has less than 3 vertices, skipped", line);
            return Ok(());
        }

        let corners = tokens
            .iter()
            .map(|token| self.parse_corner(line, token))
            .collect::<RenderResult<Vec<_>>>()?;

        for triangle in triangulate(&corners) {
            for corner in triangle {
                let index = self.vertex_index(corner);
                self.indices.push(index);
            }
        }
        Ok(())
    }

    /// Index of the interleaved vertex for `corner`, emitting it on first use.
    fn vertex_index(&mut self, corner: Corner) -> u32 {
        if let Some(&index) = self.corners.get(&corner) {
            return index;
        }

        let index = self.corners.len() as u32;
        self.vertices.extend_from_slice(&self.positions[corner.position]);
        let uv = corner.tex_coord.map_or([0.0; 2], |i| self.tex_coords[i]);
        self.vertices.extend_from_slice(&uv);
        let normal = corner.normal.map_or([0.0; 3], |i| self.normals[i]);
        self.vertices.extend_from_slice(&normal);

        self.corners.insert(corner, index);
        index
    }
}

/// Turns OBJ text into scene objects that use a copy of a template material.
pub struct ObjFileReader {
    template: Material,
}

impl Default for ObjFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjFileReader {
    pub fn new() -> Self {
        Self::with_material(primitives::textured_material())
    }

    pub fn with_material(template: Material) -> Self {
        Self { template }
    }

    pub fn to_geometry(&self, text: &str) -> RenderResult<ObjGeometry> {
        ObjParser::default().parse(text)
    }

    pub fn to_scene_object(&self, text: &str, name: &str) -> RenderResult<SceneObject> {
        let geometry = self.to_geometry(text)?;
        log::info!(
            "Imported OBJ '{}': {} vertices, {} triangles",
            name,
            geometry.vertex_count(),
            geometry.indices.len() / 3
        );

        Ok(SceneObject::new(
            VertexBuffer::new(geometry.vertices, geometry.layout),
            IndexBuffer::new(geometry.indices),
            self.template.clone(),
        )
        .with_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "
        # unit quad
        v 0 0 0
        v 1 0 0
        v 1 1 0
        v 0 1 0
        vt 0 0
        vt 1 0
        vt 1 1
        vt 0 1
        vn 0 0 1
        f 1/1/1 2/2/1 3/3/1 4/4/1
    ";

    #[test]
    fn fan_order() {
        let tris = triangulate(&[0, 1, 2, 3, 4]);
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
        assert!(triangulate(&[0, 1]).is_empty());
    }

    #[test]
    fn quad_becomes_two_triangles_over_four_vertices() {
        let geometry = ObjFileReader::new().to_geometry(QUAD).unwrap();
        assert_eq!(geometry.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.layout.stride(), 32);
    }

    #[test]
    fn shared_corner_is_emitted_once() {
        let text = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            v 1 1 0
            f 1 2 3
            f 2 4 3
        ";
        let geometry = ObjFileReader::new().to_geometry(text).unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        // Corners 2 and 3 are referenced by both faces
        assert_eq!(geometry.indices.iter().filter(|&&i| i == 1).count(), 2);
        assert_eq!(geometry.indices.iter().filter(|&&i| i == 2).count(), 2);
    }

    #[test]
    fn texcoords_are_flipped_and_normals_use_their_own_index() {
        let text = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            vt 0.25 0.25
            vn 1 0 0
            vn 0 1 0
            f 1/1/2 2/1/2 3/1/2
        ";
        let geometry = ObjFileReader::new().to_geometry(text).unwrap();
        let first = &geometry.vertices[..8];
        assert_eq!(first, &[0.0, 0.0, 0.0, 0.25, 0.75, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_attributes_are_zero() {
        let text = "v 1 2 3\nv 4 5 6\nv 7 8 9\nf 1 2 3\n";
        let geometry = ObjFileReader::new().to_geometry(text).unwrap();
        assert_eq!(&geometry.vertices[..8], &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let geometry = ObjFileReader::new().to_geometry(text).unwrap();
        assert_eq!(geometry.indices, vec![0, 1, 2]);
        assert_eq!(&geometry.vertices[8..11], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn single_component_texcoord_defaults_v() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5\nf 1/1 2/1 3/1\n";
        let geometry = ObjFileReader::new().to_geometry(text).unwrap();
        assert_eq!(&geometry.vertices[3..5], &[0.5, 1.0]);
    }

    #[test]
    fn short_position_is_a_parse_error() {
        let result = ObjFileReader::new().to_geometry("v 1 2\n");
        assert!(matches!(result, Err(RenderError::ObjParse { line: 1, .. })));
    }

    #[test]
    fn degenerate_face_is_skipped() {
        let text = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        let geometry = ObjFileReader::new().to_geometry(text).unwrap();
        assert!(geometry.indices.is_empty());
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let text = "v 0 0 0\n\nf 1 2 3\n";
        match ObjFileReader::new().to_geometry(text) {
            Err(RenderError::ObjParse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scene_object_uses_template_material() {
        let reader = ObjFileReader::new();
        let object = reader.to_scene_object(QUAD, "Quad").unwrap();
        assert_eq!(object.name(), "Quad");
        assert_eq!(object.index_buffer().len(), 6);
        assert_ne!(object.material().id(), reader.template.id());
    }
}
