use bom_stations::{LatLon, Station, StationFinder};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let finder = StationFinder::from_stations(vec![
        Station::builder()
            .id("066062")
            .name("Sydney (Observatory Hill)")
            .state("NSW")
            .latitude(-33.8607)
            .longitude(151.2050)
            .build(),
        Station::builder()
            .id("061055")
            .name("Newcastle Nobbys")
            .state("NSW")
            .latitude(-32.9184)
            .longitude(151.7985)
            .build(),
        Station::builder()
            .id("068228")
            .name("Bellambi")
            .state("NSW")
            .latitude(-34.3691)
            .longitude(150.9291)
            .build(),
        Station::builder().id("066999").name("Unmatched site").state("NSW").build(),
    ]);

    let sydney = LatLon(-33.8688, 151.2093);
    for radius_km in [50.0, 200.0] {
        let nearby = finder
            .nearby()
            .location(sydney)
            .radius_km(radius_km)
            .station_limit(5)
            .call()?;
        println!(
            "{} station(s) within {} km of Sydney:",
            nearby.stations_found, radius_km
        );
        for result in &nearby.stations {
            println!(
                "  {:<28} {:>8.2} km",
                result.station.name, result.distance_km
            );
        }
    }

    let nearby = finder.nearby().location(sydney).radius_km(200.0).call()?;
    println!("{}", serde_json::to_string_pretty(&nearby)?);
    Ok(())
}
