use std::sync::Arc;
use gendex::{
    Config, DocId, Document, FacetAggregation, FacetDefinition, FacetExecutor, FacetQuery, FieldValue,
    IndexDefinition, IndexQuery, LowMemoryNotifier, MemoryIndex, Query, SearcherHolder, SortType, TermSortMode,
};

fn holder(docs: Vec<Document>) -> SearcherHolder {
    let index = Arc::new(MemoryIndex::from_documents(docs).unwrap());
    SearcherHolder::new("Products", index, Config::default(), LowMemoryNotifier::new())
}

fn product(id: u32, category: &str, price: i32) -> Document {
    Document::new(DocId(id))
        .with_field("Category", FieldValue::Text(category.into()))
        .with_field("Price", FieldValue::Int(price))
}

fn executor() -> FacetExecutor {
    FacetExecutor::new(&Config::default(), Arc::new(IndexDefinition::new("Products")))
}

/// Five brands with 10, 8, 6, 4 and 2 documents
fn brands() -> SearcherHolder {
    let mut docs = Vec::new();
    let mut id = 0;
    for (brand, count) in [("acme", 10), ("bolt", 8), ("core", 6), ("dyna", 4), ("echo", 2)] {
        for _ in 0..count {
            docs.push(Document::new(DocId(id)).with_field("Brand", FieldValue::Text(brand.into())));
            id += 1;
        }
    }
    holder(docs)
}

#[test]
fn test_sum_aggregation_per_category() {
    let holder = holder(vec![product(0, "A", 10), product(1, "A", 30), product(2, "B", 5)]);
    let request = FacetQuery::new(
        IndexQuery::match_all(),
        vec![FacetDefinition::terms("Category").with_aggregation(FacetAggregation::Sum, "Price")],
    );

    let results = executor().run(&holder, &request).unwrap();
    let category = results.get("Category").unwrap();

    assert_eq!(category.values[0].range, "A");
    assert_eq!(category.values[0].hits, 2);
    assert_eq!(category.values[0].value, 40.0);
    assert_eq!(category.values[1].range, "B");
    assert_eq!(category.values[1].hits, 1);
    assert_eq!(category.values[1].value, 5.0);
}

#[test]
fn test_min_max_average() {
    let holder = holder(vec![product(0, "A", 10), product(1, "A", 30), product(2, "A", -5)]);
    let facets = vec![
        FacetDefinition::terms("Category").with_aggregation(FacetAggregation::Min, "Price"),
    ];
    let searcher = holder.check_out().unwrap();
    let exec = executor();

    let min = exec.execute(&searcher, &IndexQuery::match_all(), &facets, 0, None).unwrap();
    assert_eq!(min.get("Category").unwrap().values[0].value, -5.0);

    let max = FacetDefinition::terms("Category").with_aggregation(FacetAggregation::Max, "Price_Range");
    let max = exec.execute(&searcher, &IndexQuery::match_all(), &[max], 0, None).unwrap();
    assert_eq!(max.get("Category").unwrap().values[0].value, 30.0);

    let avg = FacetDefinition::terms("Category").with_aggregation(FacetAggregation::Average, "Price");
    let avg = exec.execute(&searcher, &IndexQuery::match_all(), &[avg], 0, None).unwrap();
    assert!((avg.get("Category").unwrap().values[0].value - 35.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_double_sort_type_decodes_doubles() {
    let docs = vec![
        Document::new(DocId(0))
            .with_field("Category", FieldValue::Text("A".into()))
            .with_field("Weight", FieldValue::Double(1.5)),
        Document::new(DocId(1))
            .with_field("Category", FieldValue::Text("A".into()))
            .with_field("Weight", FieldValue::Double(-0.25)),
    ];
    let holder = holder(docs);
    let definition = IndexDefinition::new("Products").with_sort_type("Weight", SortType::Double);
    let exec = FacetExecutor::new(&Config::default(), Arc::new(definition));

    let request = FacetQuery::new(
        IndexQuery::match_all(),
        vec![FacetDefinition::terms("Category").with_aggregation(FacetAggregation::Sum, "Weight")],
    );
    let results = exec.run(&holder, &request).unwrap();
    assert_eq!(results.get("Category").unwrap().values[0].value, 1.25);
}

#[test]
fn test_hits_desc_pagination_and_remaining_counts() {
    let holder = brands();
    let facet = FacetDefinition::terms("Brand")
        .with_sort(TermSortMode::HitsDesc)
        .with_remaining_terms();
    let request = FacetQuery::new(IndexQuery::match_all(), vec![facet]).with_page(2, 2);

    let results = executor().run(&holder, &request).unwrap();
    let brand = results.get("Brand").unwrap();

    let page: Vec<(&str, u64)> = brand.values.iter().map(|v| (v.range.as_str(), v.hits)).collect();
    assert_eq!(page, vec![("core", 6), ("dyna", 4)]);
    assert_eq!(brand.remaining_terms_count, 1);
    assert_eq!(brand.remaining_hits, 2);
    assert_eq!(brand.remaining_terms, Some(vec!["echo".to_string()]));
}

#[test]
fn test_remaining_terms_omitted_unless_requested() {
    let holder = brands();
    let request = FacetQuery::new(IndexQuery::match_all(), vec![FacetDefinition::terms("Brand")]).with_page(0, 1);
    let results = executor().run(&holder, &request).unwrap();
    let brand = results.get("Brand").unwrap();
    assert_eq!(brand.values[0].range, "acme");
    assert_eq!(brand.remaining_terms_count, 4);
    assert_eq!(brand.remaining_hits, 20);
    assert!(brand.remaining_terms.is_none());
}

#[test]
fn test_sort_modes_and_tiebreaks() {
    let holder = brands();
    let searcher = holder.check_out().unwrap();
    let exec = executor();
    let order = |mode: TermSortMode| -> Vec<String> {
        let facet = FacetDefinition::terms("Brand").with_sort(mode);
        exec.execute(&searcher, &IndexQuery::match_all(), &[facet], 0, None)
            .unwrap()
            .get("Brand")
            .unwrap()
            .values
            .iter()
            .map(|v| v.range.clone())
            .collect()
    };

    assert_eq!(order(TermSortMode::ValueAsc), vec!["acme", "bolt", "core", "dyna", "echo"]);
    assert_eq!(order(TermSortMode::ValueDesc), vec!["echo", "dyna", "core", "bolt", "acme"]);
    assert_eq!(order(TermSortMode::HitsAsc), vec!["echo", "dyna", "core", "bolt", "acme"]);
    assert_eq!(order(TermSortMode::HitsDesc), vec!["acme", "bolt", "core", "dyna", "echo"]);
}

#[test]
fn test_page_size_capped_by_config() {
    let holder = brands();
    let exec = FacetExecutor::new(
        &Config::default().with_max_page_size(3),
        Arc::new(IndexDefinition::new("Products")),
    );
    let facet = FacetDefinition::terms("Brand").with_max_results(100);
    let request = FacetQuery::new(IndexQuery::match_all(), vec![facet]);
    let results = exec.run(&holder, &request).unwrap();
    assert_eq!(results.get("Brand").unwrap().values.len(), 3);
    assert_eq!(results.get("Brand").unwrap().remaining_terms_count, 2);
}

#[test]
fn test_facet_max_results_used_without_page_size() {
    let holder = brands();
    let request = FacetQuery::new(IndexQuery::match_all(), vec![FacetDefinition::terms("Brand").with_max_results(2)]);
    let results = executor().run(&holder, &request).unwrap();
    assert_eq!(results.get("Brand").unwrap().values.len(), 2);
}

#[test]
fn test_start_past_end_yields_empty_page() {
    let holder = brands();
    let request = FacetQuery::new(IndexQuery::match_all(), vec![FacetDefinition::terms("Brand")]).with_page(10, 2);
    let results = executor().run(&holder, &request).unwrap();
    let brand = results.get("Brand").unwrap();
    assert!(brand.values.is_empty());
    assert_eq!(brand.remaining_terms_count, 0);
    assert_eq!(brand.remaining_hits, 0);
}

#[test]
fn test_range_facet_uses_inverted_brackets() {
    let holder = holder(vec![product(0, "A", 0), product(1, "A", 5), product(2, "A", 10), product(3, "A", 11)]);
    let facet = FacetDefinition::ranges("Price_Range", &["[0 TO 10}", "{0 TO 0}", "{11 TO NULL]"]);
    let request = FacetQuery::new(IndexQuery::match_all(), vec![facet]);

    let results = executor().run(&holder, &request).unwrap();
    let price = results.get("Price_Range").unwrap();

    // Exclusive low, inclusive high: 5 and 10 only
    assert_eq!(price.value("[0 TO 10}").unwrap().hits, 2);
    assert_eq!(price.value("{0 TO 0}").unwrap().hits, 1);
    assert_eq!(price.value("{11 TO NULL]").unwrap().hits, 1);
}

fn priced(values: Vec<FieldValue>) -> SearcherHolder {
    let docs = values
        .into_iter()
        .enumerate()
        .map(|(id, price)| Document::new(DocId(id as u32)).with_field("Price", price))
        .collect();
    holder(docs)
}

fn typed_executor(sort_type: SortType) -> FacetExecutor {
    let definition = IndexDefinition::new("Products").with_sort_type("Price", sort_type);
    FacetExecutor::new(&Config::default(), Arc::new(definition))
}

#[test]
fn test_range_facet_over_double_field() {
    let holder = priced(vec![
        FieldValue::Double(0.0),
        FieldValue::Double(5.0),
        FieldValue::Double(10.0),
        FieldValue::Double(11.0),
    ]);
    let facet = FacetDefinition::ranges("Price_Range", &["[0 TO 10}", "[0 TO 10.0}", "[0 TO 10.5}", "{10.5 TO *}"])
        .with_aggregation(FacetAggregation::Sum, "Price");
    let request = FacetQuery::new(IndexQuery::match_all(), vec![facet]);

    let results = typed_executor(SortType::Double).run(&holder, &request).unwrap();
    let price = results.get("Price_Range").unwrap();

    for range in ["[0 TO 10}", "[0 TO 10.0}", "[0 TO 10.5}"] {
        assert_eq!(price.value(range).unwrap().hits, 2, "{}", range);
        assert_eq!(price.value(range).unwrap().value, 15.0, "{}", range);
    }
    assert_eq!(price.value("{10.5 TO *}").unwrap().hits, 1);
}

#[test]
fn test_range_facet_over_long_field() {
    let big = 5_000_000_000i64;
    let holder = priced(vec![
        FieldValue::Long(-7),
        FieldValue::Long(0),
        FieldValue::Long(big),
        FieldValue::Long(big + 1),
    ]);
    let facet = FacetDefinition::ranges("Price_Range", &["{-7 TO 0]", "[0 TO 5000000000}", "{5000000001 TO NULL]"]);
    let request = FacetQuery::new(IndexQuery::match_all(), vec![facet]);

    let results = typed_executor(SortType::Long).run(&holder, &request).unwrap();
    let price = results.get("Price_Range").unwrap();

    assert_eq!(price.value("{-7 TO 0]").unwrap().hits, 1);
    assert_eq!(price.value("[0 TO 5000000000}").unwrap().hits, 1);
    assert_eq!(price.value("{5000000001 TO NULL]").unwrap().hits, 1);
}

#[test]
fn test_fractional_bound_on_int_field_is_rejected() {
    let holder = holder(vec![product(0, "A", 1)]);
    let facet = FacetDefinition::ranges("Price_Range", &["[0 TO 2.5}"]);
    let err = typed_executor(SortType::Int)
        .run(&holder, &FacetQuery::new(IndexQuery::match_all(), vec![facet]))
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.context.contains("2.5"));
}

#[test]
fn test_range_facet_aggregates_and_keeps_empty_ranges() {
    let holder = holder(vec![product(0, "A", 0), product(1, "A", 5), product(2, "A", 10), product(3, "A", 11)]);
    let sum = FacetDefinition::ranges("Price_Range", &["[0 TO 10}", "{100 TO *}"])
        .with_aggregation(FacetAggregation::Sum, "Price");
    let results = executor()
        .run(&holder, &FacetQuery::new(IndexQuery::match_all(), vec![sum]))
        .unwrap();
    let price = results.get("Price_Range").unwrap();
    assert_eq!(price.values.len(), 2);
    assert_eq!(price.values[0].value, 15.0);
    assert_eq!(price.values[1].hits, 0);
    assert_eq!(price.values[1].value, 0.0);

    let avg = FacetDefinition::ranges("Price_Range", &["{100 TO *}"]).with_aggregation(FacetAggregation::Average, "Price");
    let results = executor()
        .run(&holder, &FacetQuery::new(IndexQuery::match_all(), vec![avg]))
        .unwrap();
    assert!(results.get("Price_Range").unwrap().values[0].value.is_nan());
}

#[test]
fn test_malformed_range_aborts_whole_request() {
    let holder = holder(vec![product(0, "A", 1)]);
    let request = FacetQuery::new(
        IndexQuery::match_all(),
        vec![
            FacetDefinition::terms("Category"),
            FacetDefinition::ranges("Price_Range", &["0 .. 10"]),
        ],
    );

    let err = executor().run(&holder, &request).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.context.contains("0 .. 10"));
    assert!(err.context.contains("Price_Range"));
}

#[test]
fn test_facet_without_matches_returns_empty_result() {
    let holder = holder(vec![product(0, "A", 1)]);
    let query = IndexQuery::new(Query::term("Category", "Z"));
    let request = FacetQuery::new(query, vec![FacetDefinition::terms("Category")]);
    let results = executor().run(&holder, &request).unwrap();
    let category = results.get("Category").unwrap();
    assert!(category.values.is_empty());
    assert_eq!(category.remaining_hits, 0);
    assert_eq!(results.matched_documents, 0);
}

#[test]
fn test_multi_valued_field_counts_every_term() {
    let docs = vec![
        Document::new(DocId(0))
            .with_field("Tags", FieldValue::Text("red".into()))
            .with_field("Tags", FieldValue::Text("blue".into())),
        Document::new(DocId(1)).with_field("Tags", FieldValue::Text("red".into())),
    ];
    let holder = holder(docs);
    let request = FacetQuery::new(IndexQuery::match_all(), vec![FacetDefinition::terms("Tags")]);
    let results = executor().run(&holder, &request).unwrap();
    let tags = results.get("Tags").unwrap();
    assert_eq!(tags.value("red").unwrap().hits, 2);
    assert_eq!(tags.value("blue").unwrap().hits, 1);
}

#[test]
fn test_results_serialize_to_json() {
    let holder = holder(vec![product(0, "A", 1)]);
    let request = FacetQuery::new(IndexQuery::match_all(), vec![FacetDefinition::terms("Category")]);
    let results = executor().run(&holder, &request).unwrap();
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json["results"]["Category"]["values"][0]["range"], "A");
    assert!(json["results"]["Category"].get("remaining_terms").is_none());
}
