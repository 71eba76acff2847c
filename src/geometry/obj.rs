//! Wavefront OBJ export and import for hemisphere meshes.
//!
//! Vertices are written as positions (`v`) and, because every vertex lies on
//! the unit sphere, identical normals (`vn`). All faces go into a single
//! material group and reference position and normal by the same index.

use std::io::{self, BufRead, Write};

use glam::DVec3;

use crate::error::ObjError;

/// Material group used when none is given.
pub const DEFAULT_MATERIAL: &str = "sky";

/// Write vertices and faces as Wavefront OBJ text.
pub fn write_obj<W: Write>(
    vertices: &[DVec3],
    faces: &[[usize; 3]],
    material: &str,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "# hemisphere mesh")?;
    writeln!(writer, "# Vertices: {}, Faces: {}", vertices.len(), faces.len())?;

    for v in vertices {
        writeln!(writer, "v {:.17e} {:.17e} {:.17e}", v.x, v.y, v.z)?;
    }
    for n in vertices {
        writeln!(writer, "vn {:.17e} {:.17e} {:.17e}", n.x, n.y, n.z)?;
    }

    writeln!(writer, "usemtl {}", material)?;
    // OBJ indices are 1-based
    for &[a, b, c] in faces {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    Ok(())
}

/// Read the vertices and the faces of one material group.
///
/// Normals are ignored since they equal the positions for a unit-sphere mesh.
pub fn read_obj<R: BufRead>(
    reader: R,
    material: &str,
) -> Result<(Vec<DVec3>, Vec<[usize; 3]>), ObjError> {
    let mut vertices = Vec::new();
    let mut faces: Vec<(usize, [usize; 3])> = Vec::new();
    let mut current_material: Option<String> = None;

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_idx + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords = parse_floats(parts, line_no)?;
                vertices.push(DVec3::from_array(coords));
            }
            Some("usemtl") => {
                current_material = parts.next().map(str::to_string);
            }
            Some("f") if current_material.as_deref() == Some(material) => {
                faces.push((line_no, parse_face(parts, line_no)?));
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(ObjError::MissingMaterial(material.to_string()));
    }
    // Faces may precede vertices in the file, so indices are checked last.
    for &(line, face) in &faces {
        if let Some(&v) = face.iter().find(|&&v| v >= vertices.len()) {
            return Err(ObjError::Parse {
                line,
                message: format!("face references vertex {} of {}", v + 1, vertices.len()),
            });
        }
    }
    Ok((vertices, faces.into_iter().map(|(_, face)| face).collect()))
}

fn parse_floats<'a>(
    parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f64; 3], ObjError> {
    let values: Vec<f64> = parts
        .take(3)
        .map(|p| {
            p.parse::<f64>().map_err(|e| ObjError::Parse {
                line,
                message: format!("bad coordinate '{}': {}", p, e),
            })
        })
        .collect::<Result<_, _>>()?;
    values.try_into().map_err(|_| ObjError::Parse {
        line,
        message: "expected three coordinates".to_string(),
    })
}

fn parse_face<'a>(
    parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[usize; 3], ObjError> {
    let indices: Vec<usize> = parts
        .map(|p| {
            // "7//7", "7/1/7" or "7": the position index comes first.
            let position = p.split('/').next().unwrap_or(p);
            match position.parse::<usize>() {
                Ok(i) if i >= 1 => Ok(i - 1),
                _ => Err(ObjError::Parse {
                    line,
                    message: format!("bad face index '{}'", p),
                }),
            }
        })
        .collect::<Result<_, _>>()?;
    indices.try_into().map_err(|v: Vec<usize>| ObjError::Parse {
        line,
        message: format!("expected a triangle, got {} indices", v.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octants() -> (Vec<DVec3>, Vec<[usize; 3]>) {
        let vertices = vec![DVec3::Z, DVec3::X, DVec3::Y, -DVec3::X, -DVec3::Y];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        (vertices, faces)
    }

    #[test]
    fn test_obj_contains_vertices_normals_and_faces() {
        let (vertices, faces) = octants();
        let mut buf = Vec::new();
        write_obj(&vertices, &faces, DEFAULT_MATERIAL, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 5);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 5);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 4);
        assert!(text.contains("usemtl sky"));
        assert!(text.contains("f 1//1 2//2 3//3"));
    }

    #[test]
    fn test_read_back() {
        let (vertices, faces) = octants();
        let mut buf = Vec::new();
        write_obj(&vertices, &faces, "dome", &mut buf).unwrap();

        let (v, f) = read_obj(buf.as_slice(), "dome").unwrap();
        assert_eq!(f, faces);
        assert_eq!(v, vertices);

        assert!(matches!(
            read_obj(buf.as_slice(), "sky"),
            Err(ObjError::MissingMaterial(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        let text = "v 0 0 1\nv 1 0 0\nv 0 1 0\nusemtl sky\nf 1 2\n";
        assert!(matches!(
            read_obj(text.as_bytes(), "sky"),
            Err(ObjError::Parse { line: 5, .. })
        ));

        let text = "v 0 0 x\n";
        assert!(matches!(
            read_obj(text.as_bytes(), "sky"),
            Err(ObjError::Parse { line: 1, .. })
        ));

        let text = "v 0 0 1\nusemtl sky\nf 1 2 9\n";
        assert!(matches!(
            read_obj(text.as_bytes(), "sky"),
            Err(ObjError::Parse { line: 3, .. })
        ));
    }
}
