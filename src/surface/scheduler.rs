//! A reference split/dice scheduler.
//!
//! Renderers normally interleave splitting with bucketing and culling. This
//! scheduler drives a whole mesh to completion instead: every generation of
//! patches is tested with `diceable`, then diced, discarded or split into
//! the next generation.

use rayon::prelude::*;
use tracing::debug;

use super::bicubic::BicubicPatch;
use super::grid::MicroPolyGrid;
use super::mesh::SubdivisionMesh;
use super::motion::Motion;
use super::options::TessellateOptions;
use super::patch::{SubdivisionPatch, Surface};
use crate::algo::progress::{Counter, Progress};
use crate::error::Result;
use crate::mesh::MeshIndex;

/// Everything a mesh tessellated into.
#[derive(Debug, Clone, Default)]
pub struct Tessellation {
    /// Diced grids.
    pub grids: Vec<Motion<MicroPolyGrid>>,
    /// Bicubic patches from regular neighbourhoods.
    pub bicubics: Vec<Motion<BicubicPatch>>,
    /// Patches dropped for a zero screen extent.
    pub discarded: usize,
    /// Split generations processed.
    pub generations: u32,
}

enum Outcome<I: MeshIndex> {
    Diced(Motion<MicroPolyGrid>),
    Split(Vec<Surface<I>>),
    Discarded,
}

fn process<I: MeshIndex>(
    mut patch: SubdivisionPatch<I>,
    options: &TessellateOptions,
    force: bool,
) -> Result<Outcome<I>> {
    let dice = &options.dice;
    if patch.diceable(dice)? {
        return Ok(Outcome::Diced(patch.dice(dice)?));
    }
    if patch.is_discarded() {
        return Ok(Outcome::Discarded);
    }
    // Past the depth limit, quads that are only too large are diced at the cap.
    if force && patch.corner_count()? == 4 && !patch.is_regular()? {
        return Ok(Outcome::Diced(patch.dice(dice)?));
    }
    Ok(Outcome::Split(patch.split(dice)?))
}

/// Tessellate a mesh into grids and bicubic patches.
///
/// # Example
///
/// ```
/// use lathwork::mesh::MeshDescription;
/// use lathwork::attrib::{AttributeStore, TimeSlot};
/// use lathwork::surface::{tessellate, DiceOptions, SubdivisionMesh, TessellateOptions};
/// use nalgebra::{Matrix4, Point3};
///
/// let points = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let desc = MeshDescription::new(&[[0usize, 1, 2, 3]]).with_interpolate_boundary(true);
/// let mesh: SubdivisionMesh =
///     SubdivisionMesh::new(&desc, vec![TimeSlot::new(0.0, AttributeStore::new(points))]).unwrap();
///
/// let options = TessellateOptions::new(DiceOptions::new(Matrix4::new_scaling(4.0)));
/// let result = tessellate(&mesh, &options).unwrap();
/// assert_eq!(result.grids.len(), 1);
/// ```
pub fn tessellate<I: MeshIndex>(mesh: &SubdivisionMesh<I>, options: &TessellateOptions) -> Result<Tessellation> {
    tessellate_with_progress(mesh, options, &Progress::none())
}

/// Tessellate a mesh, reporting progress once per patch.
///
/// Progress is reported in generation units: patch `k` of `n` in generation
/// `g` reports `g + k / n` of [`TessellateOptions::split_depth`] `+ 1`.
pub fn tessellate_with_progress<I: MeshIndex>(
    mesh: &SubdivisionMesh<I>,
    options: &TessellateOptions,
    progress: &Progress,
) -> Result<Tessellation> {
    options.dice.validate()?;

    let mut out = Tessellation::default();
    let mut current: Vec<SubdivisionPatch<I>> = mesh.split()?;
    let split_depth = options.split_depth();
    let range_total = split_depth as usize + 1;

    while !current.is_empty() {
        let generation = out.generations;
        let force = generation >= split_depth;
        let total = current.len();
        let done = Counter::default();

        let step = |patch: SubdivisionPatch<I>| {
            let outcome = process(patch, options, force);
            progress.report_sub(
                done.bump(),
                total,
                (generation as usize).min(range_total - 1),
                range_total,
                "tessellating",
            );
            outcome
        };
        let outcomes = if options.dice.parallel {
            current.into_par_iter().map(step).collect::<Result<Vec<_>>>()?
        } else {
            current.into_iter().map(step).collect::<Result<Vec<_>>>()?
        };

        let mut next = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Diced(grid) => out.grids.push(grid),
                Outcome::Discarded => out.discarded += 1,
                Outcome::Split(parts) => {
                    for part in parts {
                        match part {
                            Surface::Patch(p) => next.push(p),
                            Surface::Bicubic(b) => out.bicubics.push(b),
                        }
                    }
                }
            }
        }

        debug!(
            generation,
            patches = total,
            grids = out.grids.len(),
            bicubics = out.bicubics.len(),
            next = next.len(),
            "tessellation generation"
        );
        current = next;
        out.generations += 1;
    }

    Ok(out)
}
