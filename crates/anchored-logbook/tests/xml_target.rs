#![allow(unused_crate_dependencies, reason = "These are tests, not the main crate.")]

mod util;


use anchored_logbook::{
    FacilityOptions, FacilityRegistry, TargetFileName, TargetModes, codes,
};
use anchored_logstore::MemoryStore;

use self::util::{read_lines, scratch_dir};


#[test]
fn xml_fragments_reconstruct_the_session() {
    let dir = scratch_dir("xml_fragments");
    let mut registry = FacilityRegistry::new(MemoryStore::new(), &dir);

    registry.init("suite", FacilityOptions::new().modes(TargetModes::XML)).unwrap();
    registry.log_message("suite", "starting up", Some("with details"), codes::GENERIC).unwrap();
    registry.log_message("suite", "smoke tests", None, codes::REPORT_BEGIN).unwrap();
    registry.log_message("suite", "case one passed", None, codes::REPORT_ITEM).unwrap();
    registry.log_message("suite", "case two passed", None, codes::REPORT_ITEM).unwrap();
    registry.log_message("suite", "all done", None, codes::REPORT_END).unwrap();
    registry.close("suite", false).unwrap();

    let lines = read_lines(&TargetFileName::Xml { facility: "suite" }.file_path(&dir));
    // Opened + version + message + begin + two items + end + closed.
    assert_eq!(lines.len(), 8);

    assert!(lines[0].starts_with("<LOG_OPENED "));
    assert!(lines[1].starts_with("<LOG_VERSION "));

    assert!(lines[2].starts_with("<LOG_MESSAGE "));
    assert!(lines[2].contains("Severity=\"Info\""));
    assert!(lines[2].contains("<MESSAGE><![CDATA[starting up]]></MESSAGE>"));
    assert!(lines[2].contains("<DESCRIPTION><![CDATA[with details]]></DESCRIPTION>"));
    assert!(lines[2].ends_with("</LOG_MESSAGE>"));

    // The status-report group reconstructs one nested block across records.
    assert!(lines[3].starts_with("<STATUS_REPORT "));
    assert!(lines[3].contains("Name=\"smoke tests\""));
    assert!(lines[3].ends_with('>') && !lines[3].ends_with("/>"));
    assert_eq!(lines[4], "<STATUS_ITEM><MESSAGE><![CDATA[case one passed]]></MESSAGE></STATUS_ITEM>");
    assert_eq!(lines[5], "<STATUS_ITEM><MESSAGE><![CDATA[case two passed]]></MESSAGE></STATUS_ITEM>");
    assert_eq!(lines[6], "</STATUS_REPORT>");

    assert!(lines[7].starts_with("<LOG_CLOSED "));
}

#[test]
fn the_cap_flag_wraps_the_output_in_a_root_element() {
    let dir = scratch_dir("xml_cap_flag");
    let mut registry = FacilityRegistry::new(MemoryStore::new(), &dir);

    registry.init("capped", FacilityOptions::new().modes(TargetModes::XML)).unwrap();
    registry.log_message("capped", "inside", None, codes::GENERIC).unwrap();
    registry.close("capped", true).unwrap();

    let lines = read_lines(&TargetFileName::Xml { facility: "capped" }.file_path(&dir));
    assert_eq!(lines.first().map(String::as_str), Some("<LOG>"));
    assert_eq!(lines.last().map(String::as_str),  Some("</LOG>"));
    // Root pair + opened + version + message + closed.
    assert_eq!(lines.len(), 6);
}

#[test]
fn without_the_cap_the_fragments_are_bare() {
    let dir = scratch_dir("xml_no_cap");
    let mut registry = FacilityRegistry::new(MemoryStore::new(), &dir);

    registry.init("bare", FacilityOptions::new().modes(TargetModes::XML)).unwrap();
    registry.close("bare", false).unwrap();

    let lines = read_lines(&TargetFileName::Xml { facility: "bare" }.file_path(&dir));
    assert!(lines.iter().all(|line| !line.contains("<LOG>")));
    assert_eq!(lines.len(), 3);
}

#[test]
fn hostile_text_is_contained_by_cdata_and_attribute_escaping() {
    let dir = scratch_dir("xml_hostile_text");
    let mut registry = FacilityRegistry::new(MemoryStore::new(), &dir);

    registry.init("hostile", FacilityOptions::new().modes(TargetModes::XML)).unwrap();
    registry.log_message("hostile", "a ]]> b </LOG_MESSAGE>", None, codes::GENERIC).unwrap();
    registry.log_message("hostile", "name with \"quotes\" & <brackets>", None, codes::REPORT_BEGIN).unwrap();
    registry.log_message("hostile", "end", None, codes::REPORT_END).unwrap();
    registry.close("hostile", false).unwrap();

    let lines = read_lines(&TargetFileName::Xml { facility: "hostile" }.file_path(&dir));

    // The CDATA section was split around the embedded terminator.
    assert!(lines[2].contains("<![CDATA[a ]]]]><![CDATA[> b </LOG_MESSAGE>]]>"));
    // The attribute value carries no raw metacharacters.
    assert!(lines[3].contains("Name=\"name with &quot;quotes&quot; &amp; &lt;brackets&gt;\""));
}

#[test]
fn both_kinds_can_run_side_by_side() {
    let dir = scratch_dir("both_kinds");
    let mut registry = FacilityRegistry::new(MemoryStore::new(), &dir);

    let modes = TargetModes::TEXT | TargetModes::XML;
    registry.init("dual", FacilityOptions::new().modes(modes)).unwrap();
    registry.log_message("dual", "to both", None, codes::WARNING).unwrap();
    registry.close("dual", true).unwrap();

    let text_lines = read_lines(&TargetFileName::Text { facility: "dual" }.file_path(&dir));
    let xml_lines  = read_lines(&TargetFileName::Xml  { facility: "dual" }.file_path(&dir));

    assert_eq!(text_lines.len(), 3);
    assert_eq!(text_lines[1], "Warning : to both");

    // The cap flag only affects the XML kind.
    assert_eq!(xml_lines.first().map(String::as_str), Some("<LOG>"));
    assert!(xml_lines.iter().any(|line| line.contains("<![CDATA[to both]]>")));
}
