//! Canonical text form of a grid tree.
//!
//! ```text
//! <grid name="foo" space="5px" type="mainGrid">
//!   <content>
//!     <row>
//!       <cell type="module"><content component="Text"/></cell>
//!       <cell type="grid">
//!         <content>
//!           <row>…</row>
//!         </content>
//!       </cell>
//!     </row>
//!   </content>
//! </grid>
//! ```
//!
//! Grid-kind nodes (the root and grid cells) always wrap their rows in a
//! `<content>` element; module cells hold a leaf `<content …/>`. The wrapper
//! has no node of its own in the arena.

use std::fmt;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::{LayoutError, Result};
use crate::node::{
    ATTR_MODULE_INDEX, ATTR_RELATIVE_SIZE, ATTR_TYPE, CellType, GridTree, NodeId, NodeKind,
    ResizerOrientation,
};

const CONTENT: &str = "content";

fn xml_error(err: impl fmt::Display) -> LayoutError {
    LayoutError::parse(err.to_string())
}

impl GridTree {
    /// Serialize the attached tree. Detached fragments are not written.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_node(&mut writer, self, self.root())?;
        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }

    /// Parse the text form back into a tree.
    pub fn from_xml(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut tree = Self::with_root();
        let mut stack: Vec<Frame> = Vec::new();
        let mut seen_root = false;
        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => {
                    let frame = open_element(&mut tree, &stack, &start, &mut seen_root)?;
                    stack.push(frame);
                }
                Event::Empty(start) => {
                    open_element(&mut tree, &stack, &start, &mut seen_root)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !seen_root {
            return Err(LayoutError::parse("document has no grid element"));
        }
        tracing::trace!(nodes = tree.arena_len(), "parsed grid tree");
        Ok(tree)
    }
}

fn start_tag(tree: &GridTree, id: NodeId) -> Result<BytesStart<'static>> {
    let record = tree.node(id)?;
    let mut start = BytesStart::new(record.kind.element());
    if let Some(type_attr) = record.kind.type_attr() {
        start.push_attribute((ATTR_TYPE, type_attr));
    }
    for (key, value) in &record.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    Ok(start)
}

fn write_node(writer: &mut Writer<Vec<u8>>, tree: &GridTree, id: NodeId) -> Result<()> {
    let record = tree.node(id)?;
    let element = record.kind.element();
    let start = start_tag(tree, id)?;

    if record.kind.is_grid_kind() {
        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        if record.children.is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new(CONTENT)))
                .map_err(xml_error)?;
        } else {
            writer
                .write_event(Event::Start(BytesStart::new(CONTENT)))
                .map_err(xml_error)?;
            for &child in &record.children {
                write_node(writer, tree, child)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(CONTENT)))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(element)))
            .map_err(xml_error)?;
        return Ok(());
    }

    if record.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        return Ok(());
    }
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for &child in &record.children {
        write_node(writer, tree, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element)))
        .map_err(xml_error)?;
    Ok(())
}

/// Open element on the parse stack.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Node(NodeId),
    /// `<content>` wrapper of a grid-kind node; rows attach to the node.
    Rows(NodeId),
}

fn read_attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(xml_error)?
            .to_string();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn split_type(attrs: Vec<(String, String)>) -> (Option<String>, Vec<(String, String)>) {
    let mut type_attr = None;
    let mut rest = Vec::with_capacity(attrs.len());
    for (key, value) in attrs {
        if key == ATTR_TYPE {
            type_attr = Some(value);
        } else {
            rest.push((key, value));
        }
    }
    (type_attr, rest)
}

fn validate_attribute(key: &str, value: &str) -> Result<()> {
    match key {
        ATTR_RELATIVE_SIZE => value.parse::<f64>().map(|_| ()).map_err(|_| {
            LayoutError::parse(format!("relativeSize must be a number, got {value:?}"))
        }),
        ATTR_MODULE_INDEX => value.parse::<usize>().map(|_| ()).map_err(|_| {
            LayoutError::parse(format!("module-index must be an integer, got {value:?}"))
        }),
        _ => Ok(()),
    }
}

fn open_element(
    tree: &mut GridTree,
    stack: &[Frame],
    start: &BytesStart<'_>,
    seen_root: &mut bool,
) -> Result<Frame> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let (mut type_attr, attrs) = split_type(read_attributes(start)?);
    for (key, value) in &attrs {
        validate_attribute(key, value)?;
    }

    let (frame, target) = match (name.as_str(), stack.last().copied()) {
        ("grid", None) if !*seen_root => {
            if let Some(raw) = type_attr.as_deref()
                && raw != "mainGrid"
            {
                return Err(LayoutError::invalid_type(format!(
                    "root grid must be of type mainGrid, got {raw:?}"
                )));
            }
            *seen_root = true;
            (Frame::Node(tree.root()), tree.root())
        }
        // Sub-grid wrapper inside a grid cell: its rows belong to the cell.
        ("grid", Some(Frame::Node(cell))) if tree.kind(cell)? == NodeKind::GRID_CELL => {
            if let Some(raw) = type_attr.as_deref()
                && raw != "grid"
            {
                return Err(LayoutError::invalid_type(format!(
                    "nested grid must be of type grid, got {raw:?}"
                )));
            }
            if !tree.children(cell)?.is_empty() {
                return Err(LayoutError::parse("grid cell holds more than one grid"));
            }
            for (key, value) in attrs {
                if tree.attr(cell, &key)?.is_none() {
                    tree.set_attr(cell, &key, value)?;
                }
            }
            return Ok(Frame::Node(cell));
        }
        ("content", Some(Frame::Node(parent))) => {
            let parent_kind = tree.kind(parent)?;
            if parent_kind.is_grid_kind() {
                return Ok(Frame::Rows(parent));
            }
            if !parent_kind.is_cell() {
                return Err(LayoutError::parse(format!(
                    "content is not allowed inside {}",
                    parent_kind.element()
                )));
            }
            let content = tree.create(NodeKind::Content);
            tree.append_child(parent, content)?;
            // On a leaf, `type` is a module parameter like any other.
            if let Some(raw) = type_attr.take() {
                tree.set_attr(content, ATTR_TYPE, raw)?;
            }
            (Frame::Node(content), content)
        }
        ("row", Some(Frame::Rows(grid))) => {
            let placeholder = match type_attr.as_deref() {
                None => false,
                Some("placeholder") => true,
                Some(other) => {
                    return Err(LayoutError::invalid_type(format!(
                        "row type must be placeholder, got {other:?}"
                    )));
                }
            };
            let row = tree.create(NodeKind::Row { placeholder });
            tree.append_child(grid, row)?;
            (Frame::Node(row), row)
        }
        ("cell", Some(Frame::Node(row))) if tree.kind(row)?.is_row() => {
            let cell_type = match type_attr.as_deref() {
                Some(raw) => CellType::parse(raw)?,
                None => CellType::Module,
            };
            let cell = tree.create(NodeKind::Cell { cell_type });
            tree.append_child(row, cell)?;
            (Frame::Node(cell), cell)
        }
        ("resizer", Some(frame)) => {
            let (parent, fallback) = match frame {
                Frame::Rows(grid) => (grid, ResizerOrientation::Horizontal),
                Frame::Node(row) if tree.kind(row)?.is_row() => {
                    (row, ResizerOrientation::Vertical)
                }
                Frame::Node(other) => {
                    return Err(LayoutError::parse(format!(
                        "resizer is not allowed inside {}",
                        tree.kind(other)?.element()
                    )));
                }
            };
            let orientation = match type_attr.as_deref() {
                Some(raw) => ResizerOrientation::parse(raw)?,
                None => fallback,
            };
            let resizer = tree.create(NodeKind::Resizer { orientation });
            tree.append_child(parent, resizer)?;
            (Frame::Node(resizer), resizer)
        }
        (other, _) => {
            return Err(LayoutError::parse(format!(
                "unexpected element <{other}> at depth {}",
                stack.len()
            )));
        }
    };

    for (key, value) in attrs {
        tree.set_attr(target, &key, value)?;
    }
    Ok(frame)
}
