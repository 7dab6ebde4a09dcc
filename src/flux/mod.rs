//! Flux algebra over section intersections
//!
//! Every formula integrates node values along the chains of an
//! [Intersection]. Values at chain points are interpolated linearly from the
//! triangle nodes, and each segment is integrated exactly for the product of
//! linear fields it involves:
//!
//! | Kind                   | Fields             | Integrand per unit length |
//! | ---------------------- | ------------------ | ------------------------- |
//! | `line_integral`        | f                  | f                         |
//! | `line_double_integral` | f, h               | f h                       |
//! | `line_flux`            | u, v               | (u, v) . n                |
//! | `area_flux`            | u, v, h            | h (u, v) . n              |
//! | `mass_flux`            | u, v, h, c         | c h (u, v) . n            |
//!
//! The normal `n` of a segment is its direction turned a quarter turn
//! counter-clockwise, so a flow crossing the section from its left to its
//! right side counts as negative.
//!
//! The free functions index node values directly and panic on arrays shorter
//! than the mesh. [FluxKind::evaluate] checks the lengths first.

mod calculator;

// standard library
use std::str::FromStr;

// internal modules
use crate::error::{Result, SerafinError};
use crate::mesh::{Intersection, Interpolator};
use crate::utils::f;

// external crates
use itertools::Itertools;
use serde::Serialize;

#[doc(inline)]
pub use crate::flux::calculator::{FluxCalculator, FluxResult, FluxRow};

/// Kind of flux computed along a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxKind {
    LineIntegral,
    LineDoubleIntegral,
    LineFlux,
    AreaFlux,
    MassFlux,
}

impl FluxKind {
    /// Every kind, in order of increasing arity
    pub const ALL: [FluxKind; 5] = [
        FluxKind::LineIntegral,
        FluxKind::LineDoubleIntegral,
        FluxKind::LineFlux,
        FluxKind::AreaFlux,
        FluxKind::MassFlux,
    ];

    /// Number of variables the kind consumes
    pub const fn arity(self) -> usize {
        match self {
            FluxKind::LineIntegral => 1,
            FluxKind::LineDoubleIntegral => 2,
            FluxKind::LineFlux => 2,
            FluxKind::AreaFlux => 3,
            FluxKind::MassFlux => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FluxKind::LineIntegral => "line_integral",
            FluxKind::LineDoubleIntegral => "line_double_integral",
            FluxKind::LineFlux => "line_flux",
            FluxKind::AreaFlux => "area_flux",
            FluxKind::MassFlux => "mass_flux",
        }
    }

    /// Evaluate the kind on one intersection
    ///
    /// `values` holds one node array per variable, in the order of the table
    /// above. Fails with a [SerafinError::Request] if the number of arrays
    /// does not match the arity, or if an array has fewer values than the
    /// mesh has nodes.
    pub fn evaluate(self, intersection: &Intersection, values: &[&[f64]]) -> Result<f64> {
        if let Some(short) = values.iter().find(|v| v.len() < intersection.node_count) {
            return Err(SerafinError::Request(f!(
                "{} needs one value per mesh node ({}), found {}",
                self,
                intersection.node_count,
                short.len()
            )));
        }
        match (self, values) {
            (FluxKind::LineIntegral, [f]) => Ok(line_integral(intersection, f)),
            (FluxKind::LineDoubleIntegral, [f, h]) => Ok(line_double_integral(intersection, f, h)),
            (FluxKind::LineFlux, [u, v]) => Ok(line_flux(intersection, u, v)),
            (FluxKind::AreaFlux, [u, v, h]) => Ok(area_flux(intersection, u, v, h)),
            (FluxKind::MassFlux, [u, v, h, c]) => Ok(mass_flux(intersection, u, v, h, c)),
            _ => Err(SerafinError::Request(f!(
                "{} needs {} variables, {} given",
                self,
                self.arity(),
                values.len()
            ))),
        }
    }
}

impl std::fmt::Display for FluxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FluxKind {
    type Err = SerafinError;

    /// Accepts the snake case names, with `-` in place of `_` if preferred
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase().replace('-', "_");
        FluxKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| SerafinError::Request(f!("unknown flux kind \"{s}\"")))
    }
}

/// Sum `segment(start, end, normal)` over every segment of every chain
///
/// `start` and `end` hold the interpolated value of each field at the two
/// ends of the segment.
///
/// # Panics
///
/// Every field needs a value for each node of the intersected triangles.
fn accumulate<const N: usize, F>(
    intersection: &Intersection,
    fields: [&[f64]; N],
    segment: F,
) -> f64
where
    F: Fn(&[f64; N], &[f64; N], [f64; 2]) -> f64,
{
    let mut total = 0.0;
    for triangle in &intersection.triangles {
        let [i, j, k] = triangle.nodes;
        let nodal = fields.map(|field| [field[i], field[j], field[k]]);

        for chain in &triangle.chains {
            let values: Vec<[f64; N]> = chain
                .iter()
                .map(|p| nodal.map(|v| Interpolator::interpolate(&p.weights, v)))
                .collect();
            for ((start, _), (end, p)) in values.iter().zip(chain).tuple_windows() {
                total += segment(start, end, p.edge);
            }
        }
    }
    total
}

#[inline]
fn norm(n: [f64; 2]) -> f64 {
    n[0].hypot(n[1])
}

#[inline]
fn normal_component(u: f64, v: f64, n: [f64; 2]) -> f64 {
    u * n[0] + v * n[1]
}

/// Integral of `f` along the section
pub fn line_integral(intersection: &Intersection, f: &[f64]) -> f64 {
    accumulate(intersection, [f], |a, b, n| (a[0] + b[0]) * norm(n)) / 2.0
}

/// Integral of the product `f h` along the section
pub fn line_double_integral(intersection: &Intersection, f: &[f64], h: &[f64]) -> f64 {
    accumulate(intersection, [f, h], |a, b, n| {
        let (f0, h0, f1, h1) = (a[0], a[1], b[0], b[1]);
        (2.0 * (f0 * h0 + f1 * h1) + (f0 * h1 + f1 * h0)) * norm(n)
    }) / 6.0
}

/// Flux of the vector field `(u, v)` through the section
pub fn line_flux(intersection: &Intersection, u: &[f64], v: &[f64]) -> f64 {
    accumulate(intersection, [u, v], |a, b, n| {
        normal_component(a[0], a[1], n) + normal_component(b[0], b[1], n)
    }) / 2.0
}

/// Flux of `(u, v)` weighted by `h`, the discharge for a velocity and a depth
pub fn area_flux(intersection: &Intersection, u: &[f64], v: &[f64], h: &[f64]) -> f64 {
    accumulate(intersection, [u, v, h], |a, b, n| {
        let (q0, h0) = (normal_component(a[0], a[1], n), a[2]);
        let (q1, h1) = (normal_component(b[0], b[1], n), b[2]);
        2.0 * (q0 * h0 + q1 * h1) + (q0 * h1 + q1 * h0)
    }) / 6.0
}

/// Flux of `(u, v)` weighted by `h c`, the transport of a concentration
pub fn mass_flux(
    intersection: &Intersection,
    u: &[f64],
    v: &[f64],
    h: &[f64],
    c: &[f64],
) -> f64 {
    accumulate(intersection, [u, v, h, c], |a, b, n| {
        let (q0, h0, c0) = (normal_component(a[0], a[1], n), a[2], a[3]);
        let (q1, h1, c1) = (normal_component(b[0], b[1], n), b[2], b[3]);
        9.0 * (q0 * h0 * c0 + q1 * h1 * c1)
            + (2.0 * q0 + q1) * (2.0 * h0 + h1) * (2.0 * c0 + c1)
            + (q0 + 2.0 * q1) * (h0 + 2.0 * h1) * (c0 + 2.0 * c1)
    }) / 72.0
}
