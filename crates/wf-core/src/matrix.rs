//! 2-D affine transform matrices and SVG transform lists.
//!
//! A matrix holds the six free components of
//!
//! ```text
//!   ⎛a c e⎞
//!   ⎜b d f⎟
//!   ⎝0 0 1⎠
//! ```
//!
//! `e`/`f` translate in x/y. The graph canvas keeps `a == d` as its zoom
//! factor. Composition and inversion go through `kurbo::Affine`.
//!
//! Transform attributes are parsed with `winnow` into a list of
//! [`TransformFn`]s and consolidated into a single matrix.

use crate::error::{Result, WfError};
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use winnow::ascii::float;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translate(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn to_affine(self) -> Affine {
        Affine::new([self.a, self.b, self.c, self.d, self.e, self.f])
    }

    /// `self · other`: `other` is applied first.
    #[must_use]
    pub fn multiply(self, other: Matrix) -> Matrix {
        (self.to_affine() * other.to_affine()).into()
    }

    /// `None` when the matrix is singular.
    pub fn inverse(self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(self.to_affine().inverse().into())
    }

    pub fn apply(self, p: Point) -> Point {
        self.to_affine() * p
    }

    pub fn translation(self) -> (f64, f64) {
        (self.e, self.f)
    }

    /// Attribute text for a `transform`. Non-finite components have no
    /// parseable form and are rejected.
    pub fn to_attr(self) -> Result<String> {
        let parts = [self.a, self.b, self.c, self.d, self.e, self.f];
        if parts.iter().all(|v| v.is_finite()) {
            Ok(self.to_string())
        } else {
            Err(WfError::Transform(self.to_string()))
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self { a, b, c, d, e, f }
    }
}

impl fmt::Display for Matrix {
    /// SVG attribute form, e.g. `matrix(1,0,0,1,200,150)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix({},{},{},{},{},{})",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

// ─── Transform lists ─────────────────────────────────────────────────────

/// One entry of an SVG `transform` attribute. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformFn {
    Matrix(Matrix),
    Translate(f64, f64),
    Scale(f64, f64),
    Rotate { angle: f64, cx: f64, cy: f64 },
    SkewX(f64),
    SkewY(f64),
}

impl TransformFn {
    pub fn to_matrix(self) -> Matrix {
        match self {
            TransformFn::Matrix(m) => m,
            TransformFn::Translate(x, y) => Matrix::translate(x, y),
            TransformFn::Scale(sx, sy) => Matrix::scale(sx, sy),
            TransformFn::Rotate { angle, cx, cy } => {
                let rotate = Affine::rotate(angle.to_radians());
                (Affine::translate((cx, cy)) * rotate * Affine::translate((-cx, -cy))).into()
            }
            TransformFn::SkewX(angle) => Affine::skew(angle.to_radians().tan(), 0.0).into(),
            TransformFn::SkewY(angle) => Affine::skew(0.0, angle.to_radians().tan()).into(),
        }
    }
}

/// Multiply a transform list into a single matrix. An empty list is the
/// identity.
pub fn consolidate(list: &[TransformFn]) -> Matrix {
    list.iter()
        .fold(Matrix::IDENTITY, |acc, t| acc.multiply(t.to_matrix()))
}

/// Parse an SVG `transform` attribute value.
pub fn parse_transform_list(input: &str) -> Result<Vec<TransformFn>> {
    let mut rest = input;
    let mut list = Vec::new();
    skip_separators(&mut rest);
    while !rest.is_empty() {
        let t = parse_transform_fn
            .parse_next(&mut rest)
            .map_err(|_| WfError::Transform(input.to_string()))?;
        list.push(t);
        skip_separators(&mut rest);
    }
    Ok(list)
}

/// Parse and consolidate a `transform` attribute; missing means identity.
pub fn parse_matrix(input: Option<&str>) -> Result<Matrix> {
    match input {
        Some(s) => Ok(consolidate(&parse_transform_list(s)?)),
        None => Ok(Matrix::IDENTITY),
    }
}

fn skip_separators(input: &mut &str) {
    *input = input.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
}

fn parse_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    float.parse_next(input)
}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn parse_args(input: &mut &str) -> ModalResult<SmallVec<[f64; 6]>> {
    *input = input.trim_start();
    let Some(after) = input.strip_prefix('(') else {
        return backtrack();
    };
    *input = after;
    let mut args = SmallVec::new();
    loop {
        skip_separators(input);
        if let Some(after) = input.strip_prefix(')') {
            *input = after;
            return Ok(args);
        }
        if args.len() == 6 {
            return backtrack();
        }
        args.push(parse_number(input)?);
    }
}

fn parse_transform_fn(input: &mut &str) -> ModalResult<TransformFn> {
    let name = parse_name(input)?;
    let args = parse_args(input)?;
    let t = match (name, args.as_slice()) {
        ("matrix", &[a, b, c, d, e, f]) => TransformFn::Matrix(Matrix::new(a, b, c, d, e, f)),
        ("translate", &[x]) => TransformFn::Translate(x, 0.0),
        ("translate", &[x, y]) => TransformFn::Translate(x, y),
        ("scale", &[s]) => TransformFn::Scale(s, s),
        ("scale", &[sx, sy]) => TransformFn::Scale(sx, sy),
        ("rotate", &[angle]) => TransformFn::Rotate {
            angle,
            cx: 0.0,
            cy: 0.0,
        },
        ("rotate", &[angle, cx, cy]) => TransformFn::Rotate { angle, cx, cy },
        ("skewX", &[angle]) => TransformFn::SkewX(angle),
        ("skewY", &[angle]) => TransformFn::SkewY(angle),
        _ => return backtrack(),
    };
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: Matrix, b: Matrix) -> bool {
        let (x, y) = (a.to_affine().as_coeffs(), b.to_affine().as_coeffs());
        x.iter().zip(y.iter()).all(|(p, q)| (p - q).abs() < 1e-9)
    }

    #[test]
    fn parses_matrix_form() {
        let m = parse_matrix(Some("matrix(1,0,0,1,200,150)")).unwrap();
        assert_eq!(m, Matrix::translate(200.0, 150.0));
    }

    #[test]
    fn parses_whitespace_separated_arguments() {
        let m = parse_matrix(Some("  matrix( 2 0 0 2 -5.5 1e1 ) ")).unwrap();
        assert_eq!(m, Matrix::new(2.0, 0.0, 0.0, 2.0, -5.5, 10.0));
    }

    #[test]
    fn translate_defaults_y_to_zero() {
        assert_eq!(
            parse_transform_list("translate(7)").unwrap(),
            vec![TransformFn::Translate(7.0, 0.0)]
        );
        assert_eq!(
            parse_matrix(Some("translate(0,0)")).unwrap(),
            Matrix::IDENTITY
        );
    }

    #[test]
    fn consolidates_left_to_right() {
        // translate then scale: the scale applies first to points.
        let m = parse_matrix(Some("translate(10, 20) scale(2)")).unwrap();
        assert_eq!(m, Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0));
        let p = m.apply(Point::new(1.0, 1.0));
        assert_eq!((p.x, p.y), (12.0, 22.0));
    }

    #[test]
    fn rotate_about_center_keeps_center_fixed() {
        let m = TransformFn::Rotate {
            angle: 90.0,
            cx: 5.0,
            cy: 5.0,
        }
        .to_matrix();
        let p = m.apply(Point::new(5.0, 5.0));
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn skew_x_uses_tangent() {
        let m = TransformFn::SkewX(45.0).to_matrix();
        assert!(close(m, Matrix::new(1.0, 0.0, 1.0, 1.0, 0.0, 0.0)));
    }

    #[test]
    fn empty_and_missing_are_identity() {
        assert_eq!(parse_matrix(None).unwrap(), Matrix::IDENTITY);
        assert_eq!(parse_matrix(Some("   ")).unwrap(), Matrix::IDENTITY);
    }

    #[test]
    fn rejects_unknown_functions_and_bad_arity() {
        assert!(parse_transform_list("perspective(3)").is_err());
        assert!(parse_transform_list("matrix(1,2,3)").is_err());
        assert!(parse_transform_list("translate(1,2").is_err());
    }

    #[test]
    fn display_roundtrips_through_parser() {
        let m = Matrix::new(1.2, 0.0, 0.0, 1.2, 200.0, -3.5);
        assert_eq!(m.to_string(), "matrix(1.2,0,0,1.2,200,-3.5)");
        assert_eq!(parse_matrix(Some(&m.to_string())).unwrap(), m);
    }

    #[test]
    fn inverse_undoes_translation_and_scale() {
        let m = Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 10.0);
        let inv = m.inverse().unwrap();
        assert!(close(m.multiply(inv), Matrix::IDENTITY));
        assert!(Matrix::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn non_finite_matrix_has_no_attribute_form() {
        assert_eq!(
            Matrix::translate(3.0, -1.0).to_attr().unwrap(),
            "matrix(1,0,0,1,3,-1)"
        );
        let bad = Matrix::new(1.0, 0.0, 0.0, 1.0, f64::NAN, f64::INFINITY);
        assert!(matches!(bad.to_attr(), Err(WfError::Transform(_))));
        assert!(Matrix::scale(f64::NEG_INFINITY, 1.0).to_attr().is_err());
    }
}
