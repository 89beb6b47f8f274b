//! Reading and writing drawings as svg.
//!
//! This is deliberately simple-minded: it understands the basic shape elements
//! and path data, and ignores groups, transforms and anything else that needs a
//! real svg renderer to interpret.

use kurbo::{BezPath, PathEl, Point};
use overpaint::{Ellipse, InputShape, Metadata, OutputRecord, Polygon, Primitive};
use svg::node::element::tag::Type;
use svg::node::{Attributes, Value};
use svg::parser::Event;
use svg::Document;

/// Curves in path data get approximated by line segments that are at most this
/// far from the curve.
pub const CURVE_TOLERANCE: f64 = 1e-2;

/// An svg file, split into shapes.
#[derive(Clone, Debug, Default)]
pub struct Drawing {
    /// The attributes of the root `<svg>` element, like the `viewBox`.
    pub root_attributes: Vec<(String, String)>,
    /// The shapes, in document order.
    pub shapes: Vec<InputShape>,
}

/// Problems reading a drawing.
#[derive(Debug)]
pub enum ParseError {
    /// The xml was malformed.
    Xml(String),
    /// A required attribute was missing.
    MissingAttribute {
        /// The element name, like `ellipse`.
        element: String,
        /// The attribute name, like `rx`.
        attribute: &'static str,
    },
    /// An attribute that should have been a number wasn't.
    BadNumber {
        /// The element name.
        element: String,
        /// The attribute name.
        attribute: &'static str,
        /// The attribute value.
        value: String,
    },
    /// Path data couldn't be parsed.
    BadPath(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Xml(msg) => write!(f, "malformed svg: {msg}"),
            ParseError::MissingAttribute { element, attribute } => {
                write!(f, "<{element}> is missing its {attribute} attribute")
            }
            ParseError::BadNumber {
                element,
                attribute,
                value,
            } => write!(f, "<{element}> has a bad {attribute}: {value:?}"),
            ParseError::BadPath(msg) => write!(f, "bad path data: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

fn number(element: &str, attrs: &Attributes, attribute: &'static str) -> Result<f64, ParseError> {
    let value = attrs
        .get(attribute)
        .ok_or_else(|| ParseError::MissingAttribute {
            element: element.to_owned(),
            attribute,
        })?
        .to_string();
    value.trim().parse().map_err(|_| ParseError::BadNumber {
        element: element.to_owned(),
        attribute,
        value,
    })
}

fn optional_number(
    element: &str,
    attrs: &Attributes,
    attribute: &'static str,
) -> Result<Option<f64>, ParseError> {
    if attrs.contains_key(attribute) {
        number(element, attrs, attribute).map(Some)
    } else {
        Ok(None)
    }
}

// Parses the `points` attribute of a polygon or polyline.
fn point_list(element: &str, attrs: &Attributes) -> Result<Vec<Point>, ParseError> {
    let value = attrs
        .get("points")
        .ok_or_else(|| ParseError::MissingAttribute {
            element: element.to_owned(),
            attribute: "points",
        })?
        .to_string();
    let bad = || ParseError::BadNumber {
        element: element.to_owned(),
        attribute: "points",
        value: value.clone(),
    };
    let nums = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| bad()))
        .collect::<Result<Vec<_>, _>>()?;
    if nums.len() % 2 != 0 {
        return Err(bad());
    }
    Ok(nums.chunks(2).map(|c| Point::new(c[0], c[1])).collect())
}

/// Splits path data into closed contours, approximating curves by polylines.
///
/// Every subpath is treated as closed, whether or not it ends with a `Z`.
/// Subpaths with fewer than three points enclose nothing, and are dropped.
pub fn path_to_contours(path: &BezPath) -> Vec<Vec<Point>> {
    let mut ret = Vec::new();
    let mut points = Vec::<Point>::new();
    let mut finish = |points: &mut Vec<Point>| {
        let contour = std::mem::take(points);
        if contour.len() >= 3 {
            ret.push(contour);
        }
    };
    kurbo::flatten(path.iter(), CURVE_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            finish(&mut points);
            points.push(p);
        }
        PathEl::LineTo(p) => {
            points.push(p);
        }
        PathEl::ClosePath => {
            // A subpath that's drawn after a close without a move starts where the
            // closed one started.
            let p = points.first().cloned();
            finish(&mut points);
            if let Some(p) = p {
                points.push(p);
            }
        }
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => unreachable!(),
    });
    finish(&mut points);
    ret
}

fn primitive(element: &str, attrs: &Attributes) -> Result<Option<Primitive>, ParseError> {
    let prim = match element {
        "path" => {
            let d = attrs
                .get("d")
                .ok_or_else(|| ParseError::MissingAttribute {
                    element: element.to_owned(),
                    attribute: "d",
                })?
                .to_string();
            let path = BezPath::from_svg(&d).map_err(|e| ParseError::BadPath(e.to_string()))?;
            let mut contours = path_to_contours(&path);
            match contours.len() {
                0 => return Ok(None),
                1 => Primitive::Contour(contours.remove(0)),
                _ => Primitive::Compound(contours),
            }
        }
        "ellipse" => Primitive::Ellipse(Ellipse {
            cx: number(element, attrs, "cx")?,
            cy: number(element, attrs, "cy")?,
            rx: number(element, attrs, "rx")?,
            ry: number(element, attrs, "ry")?,
        }),
        "circle" => Primitive::Ellipse(Ellipse::circle(
            number(element, attrs, "cx")?,
            number(element, attrs, "cy")?,
            number(element, attrs, "r")?,
        )),
        "rect" => {
            let x = optional_number(element, attrs, "x")?.unwrap_or(0.0);
            let y = optional_number(element, attrs, "y")?.unwrap_or(0.0);
            let w = number(element, attrs, "width")?;
            let h = number(element, attrs, "height")?;
            Primitive::Contour(vec![
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ])
        }
        "polygon" | "polyline" => Primitive::Contour(point_list(element, attrs)?),
        _ => return Ok(None),
    };
    Ok(Some(prim))
}

/// Reads the shapes out of an svg document.
///
/// Only the metadata that makes sense on a flattened shape is kept; see
/// [`Metadata::whitelisted`].
pub fn read_drawing(content: &str) -> Result<Drawing, ParseError> {
    let mut drawing = Drawing::default();
    let parser = svg::read(content).map_err(|e| ParseError::Xml(e.to_string()))?;
    for event in parser {
        match event {
            Event::Error(e) => return Err(ParseError::Xml(e.to_string())),
            Event::Tag("svg", Type::Start, attrs) => {
                let mut root: Vec<_> = attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect();
                root.sort();
                drawing.root_attributes = root;
            }
            Event::Tag(element, Type::Start | Type::Empty, attrs) => {
                if let Some(primitive) = primitive(element, &attrs)? {
                    let metadata =
                        Metadata::whitelisted(attrs.iter().map(|(k, v)| (k.clone(), v.to_string())));
                    drawing
                        .shapes
                        .push(InputShape::new(primitive).with_metadata(metadata));
                }
            }
            _ => {}
        }
    }
    Ok(drawing)
}

/// Path data for a closed polygon.
pub fn polygon_data(poly: &Polygon) -> String {
    poly.to_bez_path().to_svg()
}

/// Writes flattened shapes as an svg document, one `<path>` per record.
///
/// The paths are written in record order with the default non-zero fill, so a
/// shape with a hole comes out as two filled paths: its outer ring, then the
/// ring around the hole, which paints over whatever showed through. Consumers
/// that need the hole should regroup records by `rank` and `source_index`.
pub fn write_drawing(root_attributes: &[(String, String)], records: &[OutputRecord]) -> Document {
    let mut document = Document::new();
    for (k, v) in root_attributes {
        document = document.set(k.clone(), Value::from(v.clone()));
    }
    for record in records {
        let mut path = svg::node::element::Path::new().set("d", polygon_data(&record.polygon));
        for (k, v) in record.metadata.iter() {
            path = path.set(k, v);
        }
        document = document.add(path);
    }
    document
}
