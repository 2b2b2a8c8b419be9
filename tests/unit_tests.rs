#[cfg(test)]
mod tests {
    use clap::Parser;
    use geo::{coord, LineString, MultiPolygon, Point, Polygon};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    use tiles2coco::annotate::{polygon_to_pixels, single_ring_polygon, AnnotationSession};
    use tiles2coco::coco::{Annotation, AnnotationAttributes, CocoFile, DatasetConfig, Image};
    use tiles2coco::config::{AnnotateArgs, OpenErrorPolicy, TriageArgs};
    use tiles2coco::io::{is_tiff, read_path_list, read_probabilities, world_file_for};
    use tiles2coco::utils::default_worker_count;
    use tiles2coco::{BoundingBox, Error, GeoTransform};

    // 10x10 tile, 1 unit pixels, top-left corner at (0, 10)
    fn unit_gt() -> GeoTransform {
        GeoTransform::from_gdal(&[0.0, 1.0, 0.0, 10.0, 0.0, -1.0])
    }

    fn rect(x_left: f64, x_right: f64, y_top: f64, y_bottom: f64) -> Polygon<f64> {
        BoundingBox::new(x_left, x_right, y_top, y_bottom).to_polygon()
    }

    #[test]
    fn test_pixel_extent_to_world() {
        let bbox = unit_gt().pixel_extent_to_world(10, 10);
        assert_eq!(bbox, BoundingBox::new(0.0, 10.0, 10.0, 0.0));
        assert_eq!(bbox.width(), 10.0);
        assert_eq!(bbox.height(), 10.0);
    }

    #[test]
    fn test_world_to_pixel() {
        let gt = unit_gt();
        assert_eq!(gt.world_to_pixel(5.0, 5.0), (5, 5));
        assert_eq!(gt.world_to_pixel(0.0, 10.0), (0, 0));
        assert_eq!(gt.world_to_pixel(9.99, 0.01), (9, 9));
        // truncation toward zero, not floor
        assert_eq!(gt.world_to_pixel(-0.5, 10.5), (0, 0));
        assert_eq!(gt.world_to_pixel(-1.5, 5.0), (-1, 5));
    }

    #[test]
    fn test_geotransform_roundtrip_and_orientation() {
        let coeffs = [500000.0, 0.5, 0.0, 9000000.0, 0.0, -0.5];
        let gt = GeoTransform::from(coeffs);
        assert_eq!(gt.to_gdal(), coeffs);
        assert!(gt.is_north_up());
        assert_eq!(gt.pixel_area(), 0.25);

        let south_up = GeoTransform::from_gdal(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(!south_up.is_north_up());
    }

    #[test]
    fn test_bbox_polygon_ring() {
        let polygon = rect(2.0, 5.0, 7.0, 3.0);
        let coords: Vec<(f64, f64)> = polygon.exterior().coords().map(|c| (c.x, c.y)).collect();
        assert_eq!(
            coords,
            vec![(2.0, 7.0), (2.0, 3.0), (5.0, 3.0), (5.0, 7.0), (2.0, 7.0)]
        );
    }

    #[test]
    fn test_polygon_to_pixels_rectangle() {
        let pixels = polygon_to_pixels(&unit_gt(), &rect(2.0, 5.0, 7.0, 3.0));
        assert_eq!(pixels.segmentation, vec![2, 3, 2, 7, 5, 7, 5, 3, 2, 3]);
        assert_eq!(pixels.bbox, [2, 3, 3, 4]);
        assert_eq!(pixels.area, 12.0);
    }

    #[test]
    fn test_polygon_to_pixels_clamps_segmentation_only() {
        // object sticking out of the left edge of the tile
        let pixels = polygon_to_pixels(&unit_gt(), &rect(-3.0, 2.0, 7.0, 3.0));
        assert!(pixels.segmentation.iter().all(|&v| v >= 0));
        assert_eq!(pixels.segmentation[0], 0);
        assert_eq!(pixels.bbox, [-3, 3, 5, 4]);

        // object sticking out above the top edge
        let pixels = polygon_to_pixels(&unit_gt(), &rect(2.0, 5.0, 12.0, 8.0));
        assert_eq!(pixels.segmentation, vec![2, 0, 2, 2, 5, 2, 5, 0, 2, 0]);
        assert_eq!(pixels.bbox, [2, -2, 3, 4]);
    }

    #[test]
    fn test_polygon_to_pixels_area_in_world_units() {
        let gt = GeoTransform::from_gdal(&[0.0, 0.5, 0.0, 10.0, 0.0, -0.5]);
        let pixels = polygon_to_pixels(&gt, &rect(1.0, 3.0, 9.0, 8.0));
        assert_eq!(pixels.area, 2.0);
        assert_eq!(pixels.bbox, [2, 2, 4, 2]);
    }

    #[test]
    fn test_single_ring_polygon_accepts_plain_and_single_part() {
        let polygon = rect(0.0, 1.0, 1.0, 0.0);
        let plain = single_ring_polygon(Some(0), geo::Geometry::Polygon(polygon.clone()));
        assert_eq!(plain.unwrap(), polygon);

        let multi = MultiPolygon::new(vec![polygon.clone()]);
        let single = single_ring_polygon(Some(1), geo::Geometry::MultiPolygon(multi));
        assert_eq!(single.unwrap(), polygon);
    }

    #[test]
    fn test_single_ring_polygon_rejections() {
        let outer = rect(0.0, 4.0, 4.0, 0.0);
        let hole = LineString::new(vec![
            coord! { x: 1.0, y: 1.0 },
            coord! { x: 2.0, y: 1.0 },
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 1.0, y: 1.0 },
        ]);
        let holed = Polygon::new(outer.exterior().clone(), vec![hole]);
        let err = single_ring_polygon(Some(3), geo::Geometry::Polygon(holed)).unwrap_err();
        assert!(matches!(err, Error::GeometryShape { fid: Some(3), .. }));

        let two_parts = MultiPolygon::new(vec![outer.clone(), rect(5.0, 6.0, 6.0, 5.0)]);
        let err = single_ring_polygon(None, geo::Geometry::MultiPolygon(two_parts)).unwrap_err();
        assert!(matches!(err, Error::GeometryShape { fid: None, .. }));

        let point = geo::Geometry::Point(Point::new(1.0, 1.0));
        let err = single_ring_polygon(Some(7), point).unwrap_err();
        assert!(err.to_string().contains("point"));
    }

    #[test]
    fn test_annotation_serialization_keys() {
        let annotation = Annotation {
            id: 4,
            image_id: 2,
            category_id: 1,
            segmentation: vec![vec![2, 3, 2, 7, 5, 7, 5, 3, 2, 3]],
            area: 12.0,
            bbox: [2, 3, 3, 4],
            iscrowd: 0,
            attributes: AnnotationAttributes::default(),
        };
        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["image_id"], 2);
        assert_eq!(value["segmentation"][0].as_array().unwrap().len(), 10);
        assert_eq!(value["bbox"], serde_json::json!([2, 3, 3, 4]));
        assert_eq!(value["iscrowd"], 0);
        assert_eq!(value["attributes"]["occluded"], "false");

        let image = Image::new(0, "tile_0_0.tif".to_string(), 512, 256, 0);
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["file_name"], "tile_0_0.tif");
        assert_eq!(value["width"], 512);
        assert_eq!(value["height"], 256);
        assert_eq!(value["flickr_url"], "");
        assert_eq!(value["date_captured"], 0);
    }

    #[test]
    fn test_empty_session_document() {
        let session = AnnotationSession::new(DatasetConfig::default());
        assert_eq!(session.next_image_id(), 0);
        assert_eq!(session.next_annotation_id(), 0);

        let value = serde_json::to_value(session.document()).unwrap();
        assert_eq!(value["licenses"][0]["name"], "Swalim project");
        assert_eq!(value["licenses"][0]["id"], 0);
        assert_eq!(value["categories"][0]["id"], 1);
        assert_eq!(value["categories"][0]["name"], "kiln");
        assert_eq!(value["info"]["year"], "");
        assert!(value["images"].as_array().unwrap().is_empty());
        assert!(value["annotations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_checkpoint_is_readable() {
        let session = AnnotationSession::new(DatasetConfig::default());
        let file = NamedTempFile::new().unwrap();
        session.write_checkpoint(file.path()).unwrap();

        let document = CocoFile::read(file.path()).unwrap();
        assert_eq!(document.licenses.len(), 1);
        assert_eq!(document.categories.len(), 1);
        assert!(document.images.is_empty());
    }

    #[test]
    fn test_read_invalid_document_is_json_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"licenses\": [").unwrap();
        let err = CocoFile::read(file.path()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        let missing = CocoFile::read(&PathBuf::from("/nonexistent/coco.json")).unwrap_err();
        assert!(matches!(missing, Error::Io(_)));
    }

    #[test]
    fn test_read_path_list_sorts_and_dedupes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tiles/b.tif").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  tiles/a.tif  ").unwrap();
        writeln!(file, "tiles/b.tif").unwrap();

        let paths = read_path_list(file.path()).unwrap();
        assert_eq!(
            paths,
            vec![PathBuf::from("tiles/a.tif"), PathBuf::from("tiles/b.tif")]
        );
    }

    #[test]
    fn test_read_probabilities() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.91\n\n0.42").unwrap();
        assert_eq!(read_probabilities(file.path()).unwrap(), vec![0.91, 0.42]);

        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "0.5\nhigh").unwrap();
        assert!(read_probabilities(bad.path()).is_err());
    }

    #[test]
    fn test_tile_file_names() {
        assert!(is_tiff(&PathBuf::from("a/tile.tif")));
        assert!(is_tiff(&PathBuf::from("a/tile.TIFF")));
        assert!(!is_tiff(&PathBuf::from("a/tile.png")));
        assert!(!is_tiff(&PathBuf::from("a/list_tiles.csv")));
        assert_eq!(
            world_file_for(&PathBuf::from("a/tile.tif")),
            PathBuf::from("a/tile.tfw")
        );
    }

    #[test]
    fn test_annotate_args() {
        let args = AnnotateArgs::try_parse_from([
            "tiles2coco",
            "list.txt",
            "with",
            "without",
            "gt.shp",
            "out.json",
        ])
        .unwrap();
        assert_eq!(args.on_open_error, OpenErrorPolicy::Abort);
        assert_eq!(args.dataset_config(), DatasetConfig::default());

        let args = AnnotateArgs::try_parse_from([
            "tiles2coco",
            "list.txt",
            "with",
            "without",
            "gt.shp",
            "out.json",
            "--on-open-error",
            "skip",
            "--category-name",
            "building",
        ])
        .unwrap();
        assert_eq!(args.on_open_error, OpenErrorPolicy::Skip);
        assert_eq!(args.dataset_config().category_name, "building");
        assert_eq!(args.dataset_config().category_id, 1);

        let blank = AnnotateArgs::try_parse_from([
            "tiles2coco",
            "list.txt",
            "with",
            "without",
            "gt.shp",
            "out.json",
            "--license-name",
            " ",
        ]);
        assert!(blank.is_err());
    }

    #[test]
    fn test_triage_args_resolution() {
        let args = TriageArgs::try_parse_from(["erase-empty-tiles"]).unwrap();
        let err = args.resolve(None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let (list, dirs) = args.resolve(Some(PathBuf::from("/data"))).unwrap();
        assert_eq!(list, PathBuf::from("/data/inputs/list_tiles.csv"));
        assert_eq!(dirs.pancro, PathBuf::from("/data/inputs/Tiled/pancro"));
        assert_eq!(dirs.rgb, PathBuf::from("/data/inputs/Tiled/RGB"));

        let args = TriageArgs::try_parse_from([
            "erase-empty-tiles",
            "--list",
            "tiles.txt",
            "--pancro-dir",
            "p",
            "--rgb-dir",
            "r",
            "--workers",
            "4",
        ])
        .unwrap();
        let (list, dirs) = args.resolve(None).unwrap();
        assert_eq!(list, PathBuf::from("tiles.txt"));
        assert_eq!(dirs.rgb, PathBuf::from("r"));
        assert_eq!(args.workers, Some(4));

        assert!(TriageArgs::try_parse_from(["erase-empty-tiles", "--workers", "0"]).is_err());
    }

    #[test]
    fn test_default_worker_count() {
        assert!(default_worker_count() >= 1);
    }
}
