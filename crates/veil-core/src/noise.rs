//! 2D simplex noise.
//!
//! Same lattice, hash and gradient construction as the fragment shader in
//! `veil-wasm`, so the CPU rasterizer and the GPU path produce the same field.
//! Gradients come from a mod-289 permutation polynomial instead of a lookup
//! table, which keeps the function stateless.

/// (3 − √3) / 6: unskew factor.
const G2: f32 = 0.211_324_87;
/// (√3 − 1) / 2: skew factor.
const F2: f32 = 0.366_025_4;
/// −1 + 2·G2.
const G2_CORNER: f32 = -0.577_350_26;
/// 1 / 41 spreads hashes over the gradient ring.
const GRAD_STEP: f32 = 0.024_390_243;

/// Output scale that brings the summed corner contributions to roughly [-1, 1].
const OUTPUT_SCALE: f32 = 130.0;

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Sample 2D simplex noise at `(x, y)`. Output is in about [-1, 1].
pub fn simplex2(x: f32, y: f32) -> f32 {
    // Lattice cell containing the point, in skewed space.
    let skew = (x + y) * F2;
    let ix = (x + skew).floor();
    let iy = (y + skew).floor();

    // Offset from the cell origin, back in unskewed space.
    let unskew = (ix + iy) * G2;
    let x0 = [x - ix + unskew, y - iy + unskew];

    // Middle corner of the triangle.
    let (i1x, i1y) = if x0[0] > x0[1] { (1.0, 0.0) } else { (0.0, 1.0) };

    let x1 = [x0[0] + G2 - i1x, x0[1] + G2 - i1y];
    let x2 = [x0[0] + G2_CORNER, x0[1] + G2_CORNER];

    let ix = mod289(ix);
    let iy = mod289(iy);
    let hash = |dx: f32, dy: f32| permute(permute(iy + dy) + ix + dx);
    let p = [hash(0.0, 0.0), hash(i1x, i1y), hash(1.0, 1.0)];

    let corners = [x0, x1, x2];
    let mut total = 0.0;
    for (offset, hashed) in corners.iter().zip(p) {
        let falloff = (0.5 - (offset[0] * offset[0] + offset[1] * offset[1])).max(0.0);
        if falloff == 0.0 {
            continue;
        }
        let falloff = falloff * falloff;
        let falloff = falloff * falloff;

        let gx = 2.0 * fract(hashed * GRAD_STEP) - 1.0;
        let gy = gx.abs() - 0.5;
        let a0 = gx - (gx + 0.5).floor();

        // Approximate 1/sqrt(a0² + gy²) so gradients have unit length.
        let norm = 1.792_842_9 - 0.853_734_7 * (a0 * a0 + gy * gy);

        total += falloff * norm * (a0 * offset[0] + gy * offset[1]);
    }

    OUTPUT_SCALE * total
}
