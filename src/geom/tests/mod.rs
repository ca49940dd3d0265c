mod test_bezier_cache;
