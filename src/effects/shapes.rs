//! Proxy geometry for effect fan-out

use glam::Vec3;
use std::f32::consts::PI;

/// A vertex of a proxy shape with its surface normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyVertex {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Generate the vertices of a unit-diameter UV sphere.
///
/// `segments` latitude bands, twice as many longitude slices. Seam and pole
/// vertices are duplicated the way an indexed sphere mesh stores them, so an
/// explosion built on this sheds a few doubled sparks at the poles.
pub fn proxy_sphere(segments: u32) -> Vec<ProxyVertex> {
    let rings = segments.max(2);
    let slices = rings * 2;
    let radius = 0.5;

    let mut vertices = Vec::with_capacity(((rings + 1) * (slices + 1)) as usize);

    for ring in 0..=rings {
        let phi = ring as f32 / rings as f32 * PI;
        for slice in 0..=slices {
            let theta = slice as f32 / slices as f32 * 2.0 * PI;
            let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            vertices.push(ProxyVertex {
                position: normal * radius,
                normal,
            });
        }
    }

    vertices
}
