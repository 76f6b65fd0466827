use crate::run_test;

#[test]
fn page_media_box_bottom_left() {
    run_test("page_media_box_bottom_left");
}
#[test]
fn page_media_box_bottom_right() {
    run_test("page_media_box_bottom_right");
}
#[test]
fn page_media_box_top_left() {
    run_test("page_media_box_top_left");
}
#[test]
fn page_media_box_top_right() {
    run_test("page_media_box_top_right");
}
#[test]
fn page_media_box_zoomed_out() {
    run_test("page_media_box_zoomed_out");
}
#[test]
fn pdftc_010k_0022() {
    run_test("pdftc_010k_0022");
}
#[test]
fn pdftc_010k_0023() {
    run_test("pdftc_010k_0023");
}
#[test]
fn pdftc_010k_0026() {
    run_test("pdftc_010k_0026");
}
#[test]
fn pdftc_010k_0027() {
    run_test("pdftc_010k_0027");
}
#[test]
fn pdftc_010k_0035() {
    run_test("pdftc_010k_0035");
}
#[test]
fn pdftc_010k_0054() {
    run_test("pdftc_010k_0054");
}
#[test]
fn pdftc_010k_0077() {
    run_test("pdftc_010k_0077");
}
#[test]
fn pdftc_010k_0078() {
    run_test("pdftc_010k_0078");
}
#[test]
fn pdftc_010k_0083() {
    run_test("pdftc_010k_0083");
}
#[test]
fn pdftc_010k_0105() {
    run_test("pdftc_010k_0105");
}
#[test]
fn pdftc_010k_0129() {
    run_test("pdftc_010k_0129");
}
#[test]
fn pdftc_010k_0131() {
    run_test("pdftc_010k_0131");
}
#[test]
fn pdftc_010k_0137() {
    run_test("pdftc_010k_0137");
}
#[test]
fn pdftc_010k_0150() {
    run_test("pdftc_010k_0150");
}
#[test]
fn pdftc_010k_0160() {
    run_test("pdftc_010k_0160");
}
#[test]
fn pdftc_010k_0175() {
    run_test("pdftc_010k_0175");
}
#[test]
fn pdftc_010k_0192() {
    run_test("pdftc_010k_0192");
}
#[test]
fn pdftc_010k_0211() {
    run_test("pdftc_010k_0211");
}
#[test]
fn pdftc_010k_0400() {
    run_test("pdftc_010k_0400");
}
#[test]
fn pdftc_010k_1037() {
    run_test("pdftc_010k_1037");
}
#[test]
fn pdftc_010k_1969() {
    run_test("pdftc_010k_1969");
}
#[test]
fn pdftc_100k_0173() {
    run_test("pdftc_100k_0173");
}
#[test]
fn pdftc_100k_0234() {
    run_test("pdftc_100k_0234");
}
#[test]
fn resvg_masking_clipPath_clip_rule_evenodd() {
    run_test("resvg_masking_clipPath_clip_rule_evenodd");
}
#[test]
fn resvg_masking_clipPath_nested_clip_path() {
    run_test("resvg_masking_clipPath_nested_clip_path");
}
#[test]
fn text_rendering_clipping() {
    run_test("text_rendering_clipping");
}
#[test]
fn text_rendering_glyph_scaled() {
    run_test("text_rendering_glyph_scaled");
}
#[test]
fn text_rendering_stroking_clipping() {
    run_test("text_rendering_stroking_clipping");
}
