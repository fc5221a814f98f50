//! BuildingStore tests

#[cfg(test)]
mod tests {
    use indoor_map::{
        store::{BuildingStore, StoreEvent},
        types::{Building, BuildingData, Floor, LatLng, Poi, PoiCategory},
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn poi(id: u64, name: &str, floor_id: u64, category: Option<&str>) -> Poi {
        Poi {
            id,
            name: name.into(),
            info: String::new(),
            floor_id,
            category_id: None,
            category_name: category.map(Into::into),
            location: LatLng::new(40.4168, -3.7037),
        }
    }

    fn sample_pois() -> Vec<Poi> {
        vec![
            poi(1, "Main Entrance", 1, None),
            poi(2, "Coffee Shop", 1, None),
            poi(3, "Meeting Room", 2, Some("meeting")),
        ]
    }

    fn floor(id: u64, level: i32, name: &str) -> Floor {
        Floor {
            id,
            building_id: 7033,
            level,
            name: name.into(),
            map_url: Some(format!("https://example.com/floor-{id}.png")),
        }
    }

    fn sample_floors() -> Vec<Floor> {
        vec![
            floor(1, 0, "Ground Floor"),
            floor(2, 1, "First Floor"),
            floor(3, -1, ""),
        ]
    }

    fn building() -> Building {
        Building {
            id: 7033,
            name: "Test Building".into(),
            location: LatLng::new(40.416775, -3.70379),
            corners: vec![],
            custom_fields: Default::default(),
        }
    }

    fn ids(pois: &[Poi]) -> Vec<u64> {
        pois.iter().map(|p| p.id).collect()
    }

    // -----------------------------------------------------------------------
    // Derived view
    // -----------------------------------------------------------------------

    #[test]
    fn floor_then_search_narrows_results() {
        let store = BuildingStore::new();
        store.set_pois(sample_pois());

        store.set_selected_floor_id(Some(1));
        assert_eq!(store.filtered_pois().len(), 2);

        store.set_search_query("coffee");
        assert_eq!(ids(&store.filtered_pois()), vec![2]);

        store.set_search_query("COFFEE");
        assert_eq!(ids(&store.filtered_pois()), vec![2]);

        store.set_search_query("nonexistent");
        assert!(store.filtered_pois().is_empty());
    }

    #[test]
    fn category_name_is_searchable_across_floors() {
        let store = BuildingStore::new();
        store.set_pois(sample_pois());
        store.set_search_query("  Meet ");
        assert_eq!(ids(&store.filtered_pois()), vec![3]);
    }

    #[test]
    fn filtered_view_is_memoized_by_identity() {
        let store = BuildingStore::new();
        store.set_pois(sample_pois());
        store.set_selected_floor_id(Some(1));

        let first = store.filtered_pois();
        let second = store.filtered_pois();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.filter_computations(), 1);

        // Unrelated mutations keep the cached result.
        store.set_loading(true);
        store.set_selected_poi_id(Some(2));
        assert!(Arc::ptr_eq(&first, &store.filtered_pois()));
        assert_eq!(store.filter_computations(), 1);
    }

    #[test]
    fn any_input_change_invalidates_memo() {
        let store = BuildingStore::new();
        store.set_pois(sample_pois());
        let a = store.filtered_pois();

        store.set_search_query("room");
        let b = store.filtered_pois();
        assert!(!Arc::ptr_eq(&a, &b));

        store.set_pois(sample_pois());
        let c = store.filtered_pois();
        assert!(!Arc::ptr_eq(&b, &c));
        assert_eq!(*b, *c);
        assert_eq!(store.filter_computations(), 3);
    }

    #[test]
    fn stores_do_not_share_memo_state() {
        let one = BuildingStore::new();
        let two = BuildingStore::new();
        one.set_pois(sample_pois());
        two.set_pois(vec![poi(9, "Lift", 1, None)]);

        assert_eq!(ids(&one.filtered_pois()), vec![1, 2, 3]);
        assert_eq!(ids(&two.filtered_pois()), vec![9]);
        assert_eq!(ids(&one.filtered_pois()), vec![1, 2, 3]);
        assert_eq!(one.filter_computations(), 1);
        assert_eq!(two.filter_computations(), 1);
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[test]
    fn floor_lookup_by_id() {
        let store = BuildingStore::new();
        store.set_floors(sample_floors());
        assert_eq!(store.floor_by_id(1).map(|f| f.name), Some("Ground Floor".into()));
        assert!(store.floor_by_id(999).is_none());
    }

    #[test]
    fn dangling_ids_are_not_found() {
        let store = BuildingStore::new();
        store.set_selected_poi_id(Some(42));
        store.set_selected_floor_id(Some(7));
        assert!(store.selected_poi().is_none());
        assert!(store.selected_floor().is_none());
        assert!(store.poi_category_by_id(1).is_none());
    }

    #[test]
    fn category_lookup_by_id() {
        let store = BuildingStore::new();
        store.set_poi_categories(vec![PoiCategory {
            id: 4,
            name: Some("Access".into()),
            icon_url: "/icons/access.png".into(),
            selected_icon_url: "/icons/accessSelected.png".into(),
            visible: true,
        }]);
        assert_eq!(
            store.poi_category_by_id(4).and_then(|c| c.name),
            Some("Access".into())
        );
    }

    // -----------------------------------------------------------------------
    // Reset / load
    // -----------------------------------------------------------------------

    #[test]
    fn reset_restores_every_field() {
        let store = BuildingStore::new();
        store.set_building(building());
        store.set_floors(sample_floors());
        store.set_pois(sample_pois());
        store.set_selected_floor_id(Some(1));
        store.set_selected_poi_id(Some(2));
        store.set_search_query("coffee");
        store.set_loading(true);
        store.set_error(Some("x".into()));

        store.reset();

        let st = store.snapshot();
        assert!(st.building.is_none());
        assert!(st.floors.is_empty());
        assert!(st.pois.is_empty());
        assert!(st.poi_categories.is_empty());
        assert_eq!(st.selected_floor_id, None);
        assert_eq!(st.selected_poi_id, None);
        assert_eq!(st.search_query, "");
        assert!(!st.is_loading);
        assert_eq!(st.error, None);
    }

    #[test]
    fn applying_loaded_data_selects_first_floor_and_clears_filters() {
        let store = BuildingStore::new();
        store.set_search_query("coffee");
        store.set_selected_poi_id(Some(2));

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |ev| sink.lock().push(*ev));

        store.apply_building_data(BuildingData {
            building: building(),
            floors: sample_floors(),
            pois: sample_pois(),
            categories: vec![],
        });

        assert_eq!(*events.lock(), vec![StoreEvent::DataLoaded]);
        assert_eq!(store.selected_floor_id(), Some(1));
        assert_eq!(store.selected_poi_id(), None);
        assert_eq!(store.search_query(), "");
        assert_eq!(store.building().map(|b| b.id), Some(7033));
        assert_eq!(ids(&store.filtered_pois()), vec![1, 2]);
    }

    #[test]
    fn loading_without_floors_selects_all() {
        let store = BuildingStore::new();
        store.set_selected_floor_id(Some(3));
        store.apply_building_data(BuildingData {
            building: building(),
            floors: vec![],
            pois: sample_pois(),
            categories: vec![],
        });
        assert_eq!(store.selected_floor_id(), None);
        assert_eq!(store.filtered_pois().len(), 3);
    }
}
