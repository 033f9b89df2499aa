//! Diagnostic dumps of a lath topology.
//!
//! | Dump | Function | Notes |
//! |------|----------|-------|
//! | Wavefront OBJ | [`write_obj`], [`save_obj`] | Finest facets only, optional highlighted group |
//! | Lath table | [`write_lath_table`] | One row per lath, links and refinement cache |
//!
//! Both are meant for inspecting refinement in a viewer or a diff, not for
//! round-tripping meshes.
//!
//! ```
//! use lathwork::io::write_obj;
//! use lathwork::mesh::{build_from_polygons, Topology};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let topo: Topology = build_from_polygons(&points, &[[0usize, 1, 2, 3]]).unwrap();
//! let mut out = Vec::new();
//! write_obj(&topo, &mut out, &[]).unwrap();
//! assert!(String::from_utf8(out).unwrap().contains("f 1 2 3 4"));
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::{LathId, MeshIndex, Topology};

/// Canonical laths of every facet that has not been refined, in arena order.
pub fn finest_facets<I: MeshIndex>(topo: &Topology<I>) -> Result<Vec<LathId<I>>> {
    let mut out = Vec::new();
    for i in 0..topo.lath_count() {
        let id = LathId::new(i);
        let lath = topo.lath(id)?;
        if lath.is_refined() || topo.facet_key(id)? != id {
            continue;
        }
        out.push(id);
    }
    Ok(out)
}

fn write_face<I: MeshIndex, W: Write>(topo: &Topology<I>, out: &mut W, face: LathId<I>) -> Result<()> {
    write!(out, "f")?;
    for v in topo.facet_vertices(face)? {
        write!(out, " {}", v.index() + 1)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Write the finest facets of `topo` as OBJ.
///
/// Every vertex of the first time sample is emitted, so indices match the
/// topology's vertex ids. Facets listed in `highlight` (by any of their
/// laths) go into a separate `highlight` group.
pub fn write_obj<I: MeshIndex, W: Write>(
    topo: &Topology<I>,
    out: &mut W,
    highlight: &[LathId<I>],
) -> Result<()> {
    let marked = highlight
        .iter()
        .map(|&l| topo.facet_key(l))
        .collect::<Result<HashSet<_>>>()?;

    for p in topo.points(0)? {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let faces = finest_facets(topo)?;
    writeln!(out, "g unrefined")?;
    for &f in faces.iter().filter(|f| !marked.contains(f)) {
        write_face(topo, out, f)?;
    }
    if !marked.is_empty() {
        writeln!(out, "g highlight")?;
        for &f in faces.iter().filter(|f| marked.contains(f)) {
            write_face(topo, out, f)?;
        }
    }
    Ok(())
}

/// Write [`write_obj`] output to a file.
pub fn save_obj<P: AsRef<Path>, I: MeshIndex>(
    topo: &Topology<I>,
    path: P,
    highlight: &[LathId<I>],
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_obj(topo, &mut writer, highlight)?;
    writer.flush()?;
    Ok(())
}

fn link<I: MeshIndex>(id: Option<LathId<I>>) -> String {
    id.map_or_else(|| "-".to_string(), |l| l.index().to_string())
}

/// Write one row per lath: vertex, links, refinement cache, base facet and
/// level. Unset links print as `-`.
pub fn write_lath_table<I: MeshIndex, W: Write>(topo: &Topology<I>, out: &mut W) -> Result<()> {
    writeln!(out, "lath\tvertex\tcf\tcv\tparent\tchild\tmid\tface\tfacet\tlevel")?;
    for i in 0..topo.lath_count() {
        let lath = topo.lath(LathId::new(i))?;
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            i,
            lath.vertex().index(),
            link(lath.face_neighbor().get()),
            link(lath.vertex_neighbor()),
            link(lath.parent_facet()),
            link(lath.child_vertex()),
            link(lath.mid_vertex()),
            link(lath.face_vertex()),
            lath.facet().index(),
            lath.level()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::subdivide::subdivide_face;
    use crate::mesh::{build_from_polygons, grid_mesh, FacetId};

    fn quad() -> Topology {
        let (points, faces) = grid_mesh(1, 1);
        build_from_polygons(&points, &faces).unwrap()
    }

    fn obj(topo: &Topology, highlight: &[LathId<u32>]) -> Vec<String> {
        let mut out = Vec::new();
        write_obj(topo, &mut out, highlight).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_obj_of_base_mesh() {
        let lines = obj(&quad(), &[]);
        assert_eq!(lines.iter().filter(|l| l.starts_with("v ")).count(), 4);
        assert!(lines.contains(&"f 1 2 4 3".to_string()));
        assert!(!lines.contains(&"g highlight".to_string()));
    }

    #[test]
    fn test_obj_lists_only_finest_faces() {
        let mut topo = quad();
        let face = topo.facet(FacetId::new(0)).unwrap();
        let children = subdivide_face(&mut topo, face).unwrap();

        let lines = obj(&topo, &children[..1]);
        assert_eq!(lines.iter().filter(|l| l.starts_with("v ")).count(), 9);
        assert_eq!(lines.iter().filter(|l| l.starts_with("f ")).count(), 4);

        let split = lines.iter().position(|l| l == "g highlight").unwrap();
        assert_eq!(lines[split + 1..].iter().filter(|l| l.starts_with("f ")).count(), 1);
        assert!(!lines.contains(&"f 1 2 4 3".to_string()));
    }

    #[test]
    fn test_lath_table() {
        let mut topo = quad();
        let face = topo.facet(FacetId::new(0)).unwrap();
        subdivide_face(&mut topo, face).unwrap();

        let mut out = Vec::new();
        write_lath_table(&topo, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), topo.lath_count() + 1);
        assert!(rows[0].starts_with("lath\tvertex"));
        // base laths are level 0 with no parent, children are level 1
        let first: Vec<&str> = rows[1].split('\t').collect();
        assert_eq!(first[4], "-");
        assert_eq!(first[9], "0");
        assert!(rows.last().unwrap().ends_with("\t1"));
    }
}
