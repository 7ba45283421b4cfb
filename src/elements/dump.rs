//! Human readable element dump, mostly for debugging.

use super::{Element, ElementKind};
use crate::io::dgn::linkage::{linkage_type, linkages};
use crate::types::{ElementProperties, Vector3};
use std::io::{self, Write};

fn point(p: &Vector3) -> String {
    format!("({:.6},{:.6},{:.6})", p.x, p.y, p.z)
}

/// Write a multi-line description of an element.
pub fn dump_element<W: Write>(element: &Element, out: &mut W) -> io::Result<()> {
    let core = &element.core;

    writeln!(
        out,
        "\nElement:{:<12} Level:{:2} id:{}",
        core.type_name(),
        core.level,
        core.element_id.map_or_else(|| "-".to_string(), |id| id.to_string())
    )?;
    if let Some(offset) = core.offset {
        writeln!(out, "  offset={} size={} bytes", offset, core.size)?;
    } else {
        writeln!(out, "  size={} bytes", core.size)?;
    }
    writeln!(
        out,
        "  graphic_group:{:<3} color:{} weight:{} style:{}",
        core.graphic_group, core.color, core.weight, core.style
    )?;

    if core.properties.bits() != 0 {
        write!(out, "  properties={}", core.properties.bits())?;
        for (flag, name) in [
            (ElementProperties::HOLE, "HOLE"),
            (ElementProperties::SNAPPABLE, "SNAPPABLE"),
            (ElementProperties::PLANAR, "PLANAR"),
            (ElementProperties::ORIENTATION, "ORIENTATION"),
            (ElementProperties::ATTRIBUTES, "ATTRIBUTES"),
            (ElementProperties::MODIFIED, "MODIFIED"),
            (ElementProperties::NEW, "NEW"),
            (ElementProperties::LOCKED, "LOCKED"),
        ] {
            if core.properties.contains(flag) {
                write!(out, ",{}", name)?;
            }
        }
        writeln!(out, " class={}", core.properties.class())?;
    }
    if core.complex || core.deleted {
        writeln!(
            out,
            "  {}{}",
            if core.complex { "complex " } else { "" },
            if core.deleted { "deleted" } else { "" }
        )?;
    }

    dump_kind(&element.kind, out)?;

    for link in linkages(element) {
        let name = linkage_type::name(link.linkage_type)
            .map_or_else(|| format!("{:#06x}", link.linkage_type), str::to_string);
        write!(out, "  Attribute Linkage[{}] type={} size={}", link.index, name, link.size())?;
        if link.entity_num != 0 || link.ms_link != 0 {
            write!(out, " entity={} mslink={}", link.entity_num, link.ms_link)?;
        }
        writeln!(out)?;
    }

    if !core.raw_data.is_empty() {
        writeln!(out, "  Raw Data ({} bytes):", core.raw_data.len())?;
        for (i, chunk) in core.raw_data.chunks(16).enumerate() {
            write!(out, "    {:6}:", i * 16)?;
            for b in chunk {
                write!(out, " {:02x}", b)?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn dump_kind<W: Write>(kind: &ElementKind, out: &mut W) -> io::Result<()> {
    match kind {
        ElementKind::Core => {}
        ElementKind::MultiPoint(mp) => {
            for v in &mp.vertices {
                writeln!(out, "  {}", point(v))?;
            }
        }
        ElementKind::Arc(arc) => {
            writeln!(
                out,
                "  origin={}\n  axes=({:.6},{:.6}) rotation={:.6}",
                point(&arc.origin),
                arc.primary_axis,
                arc.secondary_axis,
                arc.rotation
            )?;
            writeln!(out, "  start={:.6} sweep={:.6}", arc.start_angle, arc.sweep_angle)?;
        }
        ElementKind::Text(text) => {
            writeln!(
                out,
                "  origin={} rotation={:.6}\n  font={} just={} length_mult={:.6} height_mult={:.6}",
                point(&text.origin),
                text.rotation,
                text.font_id,
                text.justification,
                text.length_mult,
                text.height_mult
            )?;
            writeln!(out, "  text={}", text.text)?;
        }
        ElementKind::TextNode(node) => {
            writeln!(
                out,
                "  totlength={} num_texts={} node={} max_length={} max_used={}",
                node.totlength, node.numelems, node.node_number, node.max_length, node.max_used
            )?;
            writeln!(
                out,
                "  font={} just={} length_mult={:.6} height_mult={:.6}\n  origin={} rotation={:.6}",
                node.font_id,
                node.justification,
                node.length_mult,
                node.height_mult,
                point(&node.origin),
                node.rotation
            )?;
        }
        ElementKind::ComplexHeader(h) => {
            writeln!(out, "  totlength={} numelems={}", h.totlength, h.numelems)?;
            if h.surftype != 0 || h.boundelms != 0 {
                writeln!(out, "  surftype={} boundelms={}", h.surftype, h.boundelms)?;
            }
        }
        ElementKind::ColorTable(ct) => {
            writeln!(out, "  screen_flag: {}", ct.screen_flag)?;
            for (i, c) in ct.colors.iter().enumerate() {
                writeln!(out, "  {:3}: {}", i, c)?;
            }
        }
        ElementKind::Tcb(tcb) => {
            writeln!(out, "  dimension={}", tcb.dimension)?;
            writeln!(
                out,
                "  uor_per_subunit={} subunits=`{}'\n  subunits_per_master={} master units=`{}'",
                tcb.uor_per_subunit, tcb.sub_units, tcb.subunits_per_master, tcb.master_units
            )?;
            writeln!(out, "  origin={}", point(&tcb.origin))?;
            for (i, view) in tcb.views.iter().enumerate() {
                writeln!(
                    out,
                    "  View{}: flags={:04X} levels={:02X?}\n        origin={} delta={}",
                    i,
                    view.flags,
                    view.levels,
                    point(&view.origin),
                    point(&view.delta)
                )?;
            }
        }
        ElementKind::CellHeader(cell) => {
            writeln!(
                out,
                "  totlength={} name={} class={:x} levels={:04x}{:04x}{:04x}{:04x}",
                cell.totlength,
                cell.name,
                cell.cclass,
                cell.levels[3],
                cell.levels[2],
                cell.levels[1],
                cell.levels[0]
            )?;
            writeln!(
                out,
                "  rnglow={} rnghigh={}\n  origin={}",
                point(&cell.rnglow),
                point(&cell.rnghigh),
                point(&cell.origin)
            )?;
            writeln!(
                out,
                "  xscale={:.6} yscale={:.6} rotation={:.6}",
                cell.xscale, cell.yscale, cell.rotation
            )?;
        }
        ElementKind::CellLibrary(lib) => {
            writeln!(
                out,
                "  name={} class={:x} levels={:04x}{:04x}{:04x}{:04x} numwords={}",
                lib.name,
                lib.cclass,
                lib.levels[3],
                lib.levels[2],
                lib.levels[1],
                lib.levels[0],
                lib.numwords
            )?;
            writeln!(
                out,
                "  dispsymb={} properties={}\n  description={}",
                lib.dispsymb, lib.properties, lib.description
            )?;
        }
        ElementKind::TagSet(set) => {
            writeln!(
                out,
                "  tagSetName={} tagSet={} tagCount={} flags={}",
                set.tag_set_name,
                set.tag_set.map_or(-1, i32::from),
                set.tags.len(),
                set.flags
            )?;
            for tag in &set.tags {
                writeln!(
                    out,
                    "    {}: name={}, type={}, prompt={}, default={}",
                    tag.id, tag.name, tag.tag_type, tag.prompt, tag.default_value
                )?;
            }
        }
        ElementKind::TagValue(tag) => {
            writeln!(
                out,
                "  tagType={} tagSet={} tagIndex={} tagLength={}\n  value={}",
                tag.tag_type, tag.tag_set, tag.tag_index, tag.tag_length, tag.value
            )?;
        }
        ElementKind::Cone(cone) => {
            writeln!(
                out,
                "  center_1={} radius={:.6}\n  center_2={} radius={:.6}",
                point(&cone.center_1),
                cone.radius_1,
                point(&cone.center_2),
                cone.radius_2
            )?;
            writeln!(
                out,
                "  quat={},{},{},{} unknown={}",
                cone.quat[0], cone.quat[1], cone.quat[2], cone.quat[3], cone.unknown
            )?;
        }
        ElementKind::BSplineSurfaceHeader(h) => {
            writeln!(
                out,
                "  desc_words={} curve_type={} num_bounds={}",
                h.desc_words, h.curve_type, h.num_bounds
            )?;
            writeln!(
                out,
                "  U: order={} properties={} poles={} knots={} rule_lines={}",
                h.u_order, h.u_properties, h.num_poles_u, h.num_knots_u, h.rule_lines_u
            )?;
            writeln!(
                out,
                "  V: order={} properties={} poles={} knots={} rule_lines={}",
                h.v_order, h.v_properties, h.num_poles_v, h.num_knots_v, h.rule_lines_v
            )?;
        }
        ElementKind::BSplineCurveHeader(h) => {
            writeln!(
                out,
                "  desc_words={} order={} properties={} curve_type={} poles={} knots={}",
                h.desc_words, h.order, h.properties, h.curve_type, h.num_poles, h.num_knots
            )?;
        }
        ElementKind::BSplineSurfaceBoundary(b) => {
            writeln!(out, "  boundary number={}", b.number)?;
            for v in &b.vertices {
                writeln!(out, "  ({:.6},{:.6})", v.x, v.y)?;
            }
        }
        ElementKind::KnotWeight(kw) => {
            let values: Vec<String> = kw.values.iter().map(|v| format!("{:.6}", v)).collect();
            writeln!(out, "  {}", values.join(" "))?;
        }
        ElementKind::SharedCellDefn(def) => {
            writeln!(out, "  totlength={}", def.totlength)?;
        }
    }
    Ok(())
}
